// Copyright (c) 2025 - Cowboy AI, Inc.
//! Applying a Stack
//!
//! Walks the dependency waves of a validated stack and asks a
//! [`Provisioner`] to create each resource:
//!
//! ```text
//! wave 0: [Vpc, Role, ...]          ──join_all──> provisioned
//! wave 1: [Subnets, Group, ...]     ──join_all──> provisioned
//! ...
//! outputs resolved from provisioned attributes
//! ```
//!
//! Resources of one wave are created concurrently; waves are strictly
//! sequential, so nothing is submitted before everything it depends on
//! exists. The first wave with a failing resource stops the walk. Resources
//! created up to that point are left in place and listed in the error;
//! there is no retry and no rollback.

pub mod provisioner;
pub mod resolve;

pub use provisioner::{ProvisionError, ProvisionRequest, ProvisionedResource, Provisioner};
pub use resolve::{ApplyContext, DEFAULT_RESOURCE_TIMEOUT};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::LogicalId;
use crate::errors::StackError;
use crate::graph::DependencyGraph;
use crate::stack::Stack;

use resolve::Resolver;

/// Why an apply stopped
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The stack did not validate; nothing was created
    #[error(transparent)]
    Stack(#[from] StackError),

    /// A parameter has neither a supplied value nor a default
    #[error("No value supplied for parameter {0}")]
    MissingParameter(LogicalId),

    /// A resource could not be created; earlier resources remain
    #[error(
        "Resource {resource} failed: {cause} ({} resource(s) already created were left in place)",
        .created.len()
    )]
    ResourceFailed {
        resource: LogicalId,
        #[source]
        cause: ProvisionError,
        created: Vec<LogicalId>,
    },

    /// Every resource exists but an output could not be evaluated
    #[error("Output {output} could not be resolved: {cause}")]
    OutputUnresolved {
        output: LogicalId,
        #[source]
        cause: ProvisionError,
    },
}

impl ApplyError {
    /// Resources that exist after the failed apply
    pub fn created(&self) -> &[LogicalId] {
        match self {
            Self::ResourceFailed { created, .. } => created,
            _ => &[],
        }
    }
}

/// Result of a completed apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub apply_id: Uuid,
    pub stack_name: String,
    pub provisioner: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Logical ids in the order they were submitted, wave by wave
    pub waves: Vec<Vec<LogicalId>>,
    pub resources: BTreeMap<LogicalId, ProvisionedResource>,
    pub outputs: BTreeMap<LogicalId, serde_json::Value>,
}

impl ApplyReport {
    /// Resolved output by its declared name (sanitized like a logical id)
    pub fn output(&self, name: &str) -> Option<&serde_json::Value> {
        let id = LogicalId::sanitize(name).ok()?;
        self.outputs.get(&id)
    }

    pub fn resource(&self, id: &LogicalId) -> Option<&ProvisionedResource> {
        self.resources.get(id)
    }
}

/// Create every resource of `stack` through `provisioner`
pub async fn apply(
    stack: &Stack,
    provisioner: &dyn Provisioner,
    context: &ApplyContext,
) -> Result<ApplyReport, ApplyError> {
    let started_at = Utc::now();
    let apply_id = Uuid::now_v7();
    let graph = DependencyGraph::build(stack)?;

    let mut parameters = BTreeMap::new();
    for (id, parameter) in stack.parameters() {
        let value = context
            .parameters
            .get(id.as_str())
            .or(parameter.default.as_ref())
            .ok_or_else(|| ApplyError::MissingParameter(id.clone()))?;
        parameters.insert(id.as_str().to_string(), value.clone());
    }

    info!(
        "Applying stack {} ({}) through {}: {} resources in {} waves",
        stack.name(),
        apply_id,
        provisioner.name(),
        graph.len(),
        graph.waves().len()
    );

    let mut provisioned: BTreeMap<LogicalId, ProvisionedResource> = BTreeMap::new();
    let mut created: Vec<LogicalId> = Vec::new();

    for (index, wave) in graph.waves().iter().enumerate() {
        debug!("Wave {}: {:?}", index, wave);

        let mut requests = Vec::with_capacity(wave.len());
        {
            let resolver = Resolver {
                context,
                stack_name: stack.name(),
                parameters: &parameters,
                provisioned: &provisioned,
            };
            for id in wave {
                let resource = stack
                    .resource(id)
                    .ok_or_else(|| StackError::UnknownResource(id.clone()))?;
                let mut properties = serde_json::Map::new();
                for (key, value) in resource.properties() {
                    match resolver.resolve(value) {
                        Ok(json) => {
                            properties.insert(key.clone(), json);
                        }
                        Err(cause) => {
                            error!("Cannot resolve {}.{}: {}", id, key, cause);
                            return Err(ApplyError::ResourceFailed {
                                resource: id.clone(),
                                cause,
                                created,
                            });
                        }
                    }
                }
                requests.push(ProvisionRequest {
                    logical_id: id.clone(),
                    resource_type: resource.resource_type(),
                    properties,
                });
            }
        }

        let outcomes = join_all(requests.iter().map(|request| async move {
            let outcome =
                match tokio::time::timeout(context.resource_timeout, provisioner.create(request))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProvisionError::Timeout(context.resource_timeout)),
                };
            (request.logical_id.clone(), outcome)
        }))
        .await;

        // Siblings that succeeded exist even when another member of the wave failed
        let mut failure = None;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(resource) => {
                    info!("Created {} as {}", id, resource.physical_id);
                    provisioned.insert(id.clone(), resource);
                    created.push(id);
                }
                Err(cause) => {
                    error!("Failed to create {}: {}", id, cause);
                    if failure.is_none() {
                        failure = Some((id, cause));
                    }
                }
            }
        }

        if let Some((resource, cause)) = failure {
            return Err(ApplyError::ResourceFailed {
                resource,
                cause,
                created,
            });
        }
    }

    let resolver = Resolver {
        context,
        stack_name: stack.name(),
        parameters: &parameters,
        provisioned: &provisioned,
    };
    let mut outputs = BTreeMap::new();
    for (id, output) in stack.outputs() {
        let value = resolver
            .resolve(&output.value)
            .map_err(|cause| ApplyError::OutputUnresolved {
                output: id.clone(),
                cause,
            })?;
        info!("Output {} = {}", id, value);
        outputs.insert(id.clone(), value);
    }

    Ok(ApplyReport {
        apply_id,
        stack_name: stack.name().to_string(),
        provisioner: provisioner.name().to_string(),
        started_at,
        finished_at: Utc::now(),
        waves: graph.waves().to_vec(),
        resources: provisioned,
        outputs,
    })
}
