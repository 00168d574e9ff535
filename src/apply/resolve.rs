// Copyright (c) 2025 - Cowboy AI, Inc.
//! Intrinsic Resolution
//!
//! Evaluates declared [`Value`]s into plain JSON the way the engine does at
//! deploy time: `Ref` becomes the physical id of an already provisioned
//! resource (or a parameter value), `Fn::GetAtt` becomes a provider
//! attribute, and the remaining intrinsics are computed from the
//! [`ApplyContext`].

use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::LogicalId;
use crate::stack::{PseudoParameter, Value};

use super::provisioner::{ProvisionError, ProvisionedResource};

/// Default per-resource timeout
pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Deploy-time environment an apply runs in
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyContext {
    pub region: String,
    pub account_id: String,
    pub partition: String,
    pub url_suffix: String,
    pub availability_zones: Vec<String>,
    pub resource_timeout: Duration,
    /// Values for the stack's parameters, keyed by parameter id
    pub parameters: BTreeMap<String, String>,
}

impl ApplyContext {
    /// Context for a region, with zones `<region>a`, `<region>b`, `<region>c`
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        let region = region.into();
        let availability_zones = ["a", "b", "c"]
            .iter()
            .map(|suffix| format!("{}{}", region, suffix))
            .collect();
        Self {
            region,
            account_id: account_id.into(),
            partition: "aws".to_string(),
            url_suffix: "amazonaws.com".to_string(),
            availability_zones,
            resource_timeout: DEFAULT_RESOURCE_TIMEOUT,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, id: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(id.to_string(), value.into());
        self
    }

    pub fn with_resource_timeout(mut self, timeout: Duration) -> Self {
        self.resource_timeout = timeout;
        self
    }

    pub fn with_availability_zones(mut self, zones: Vec<String>) -> Self {
        self.availability_zones = zones;
        self
    }
}

/// Resolves values against the resources provisioned so far
pub(crate) struct Resolver<'a> {
    pub context: &'a ApplyContext,
    pub stack_name: &'a str,
    pub parameters: &'a BTreeMap<String, String>,
    pub provisioned: &'a BTreeMap<LogicalId, ProvisionedResource>,
}

fn unresolved(message: String) -> ProvisionError {
    ProvisionError::Unresolved(message)
}

impl Resolver<'_> {
    pub fn resolve(&self, value: &Value) -> Result<Json, ProvisionError> {
        match value {
            Value::Literal(json) => Ok(json.clone()),
            Value::NameOf { name, .. } => Ok(Json::String(name.clone())),
            Value::Ref(id) => {
                if let Some(resource) = self.provisioned.get(id) {
                    return Ok(Json::String(resource.physical_id.clone()));
                }
                self.parameters
                    .get(id.as_str())
                    .map(|v| Json::String(v.clone()))
                    .ok_or_else(|| unresolved(format!("Ref {} has not been provisioned", id)))
            }
            Value::GetAtt(id, attribute) => {
                let resource = self.provisioned.get(id).ok_or_else(|| {
                    unresolved(format!("Fn::GetAtt {}.{} has not been provisioned", id, attribute))
                })?;
                resource.attribute(attribute).cloned().ok_or_else(|| {
                    unresolved(format!("{} reported no attribute {}", id, attribute))
                })
            }
            Value::Pseudo(parameter) => Ok(Json::String(self.pseudo(*parameter))),
            Value::AvailabilityZones => Ok(Json::Array(
                self.context
                    .availability_zones
                    .iter()
                    .cloned()
                    .map(Json::String)
                    .collect(),
            )),
            Value::Select(index, inner) => match self.resolve(inner)? {
                Json::Array(mut items) if *index < items.len() => Ok(items.swap_remove(*index)),
                Json::Array(items) => Err(unresolved(format!(
                    "Fn::Select index {} out of range for {} items",
                    index,
                    items.len()
                ))),
                other => Err(unresolved(format!("Fn::Select over non-list {}", other))),
            },
            Value::Join(delimiter, parts) => {
                let mut pieces = Vec::with_capacity(parts.len());
                for part in parts {
                    pieces.push(match self.resolve(part)? {
                        Json::String(s) => s,
                        Json::Number(n) => n.to_string(),
                        other => {
                            return Err(unresolved(format!("Fn::Join over non-scalar {}", other)))
                        }
                    });
                }
                Ok(Json::String(pieces.join(delimiter)))
            }
            Value::List(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok::<_, ProvisionError>((key.clone(), self.resolve(item)?)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Json::Object),
        }
    }

    fn pseudo(&self, parameter: PseudoParameter) -> String {
        match parameter {
            PseudoParameter::AccountId => self.context.account_id.clone(),
            PseudoParameter::Partition => self.context.partition.clone(),
            PseudoParameter::Region => self.context.region.clone(),
            PseudoParameter::StackName => self.stack_name.to_string(),
            PseudoParameter::UrlSuffix => self.context.url_suffix.clone(),
        }
    }
}
