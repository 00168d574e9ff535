// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioner Seam
//!
//! The orchestration engine that actually creates resources lives behind
//! [`Provisioner`]. The apply walk hands it one fully resolved request per
//! resource and records what comes back, so the physical id and generated
//! attributes (endpoints, ARNs, ports) are whatever the provider says they
//! are.
//!
//! ```text
//! Resource (Value)  ──resolve──>  ProvisionRequest (JSON)
//!                                        │
//!                                        ▼
//!                               Provisioner::create()
//!                                        │
//!                                        ▼
//!                               ProvisionedResource
//!                          (physical id, attributes)
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::{LogicalId, ResourceType};

/// One resource, with every intrinsic already resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionRequest {
    pub logical_id: LogicalId,
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ProvisionRequest {
    /// A resolved string property, if present
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

/// What the provider reports back for a created resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedResource {
    /// Value a `Ref` to the resource resolves to
    pub physical_id: String,
    /// Values `Fn::GetAtt` on the resource resolves to
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ProvisionedResource {
    pub fn new(physical_id: impl Into<String>) -> Self {
        Self {
            physical_id: physical_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

/// Why a single resource could not be created
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProvisionError {
    /// The provider refused the request
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    /// The provider did not answer within the per-resource timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// A property could not be resolved against what already exists
    #[error("Unresolved property: {0}")]
    Unresolved(String),

    /// Transport or provider-side failure
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Creates resources on behalf of the apply walk
///
/// Resources of one wave are submitted concurrently, so implementations
/// take `&self` and must be safe to call from several tasks at once.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Name used in logs and in the apply report
    fn name(&self) -> &str;

    /// Create one resource and report its physical id and attributes
    async fn create(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedResource, ProvisionError>;
}
