// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph Declaration
//!
//! A [`Stack`] is the set of resource declarations, parameters and outputs
//! that is handed to the orchestration engine. Declaring a resource does
//! nothing on its own; the graph is checked by [`crate::graph`] and turned
//! into a template by [`crate::synth`].
//!
//! ```text
//! constructs ──add()──> Stack ──DependencyGraph::build──> waves
//!                         │
//!                         └──synthesize──> Template (JSON)
//! ```

pub mod resource;
pub mod value;

pub use resource::Resource;
pub use value::{PseudoParameter, Value};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{LogicalId, ResourceType};
use crate::errors::{StackError, StackResult};

/// Template parameter supplied at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Numeric and boolean defaults of a deployed template are kept as text
    #[serde(
        default,
        deserialize_with = "scalar_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
}

fn scalar_default<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "parameter default must be a scalar, got {}",
            other
        ))),
    }
}

impl Parameter {
    /// A string parameter
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: Some(description.into()),
            default: None,
        }
    }
}

/// Value surfaced to the operator after apply
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
}

/// The resource graph
#[derive(Debug, Clone, Default)]
pub struct Stack {
    name: String,
    description: Option<String>,
    resources: BTreeMap<LogicalId, Resource>,
    parameters: BTreeMap<LogicalId, Parameter>,
    outputs: BTreeMap<LogicalId, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declare a resource
    ///
    /// # Invariant
    /// - Logical ids are unique across resources and parameters
    pub fn add(&mut self, resource: Resource) -> StackResult<LogicalId> {
        let id = resource.logical_id().clone();
        if self.is_declared(&id) {
            return Err(StackError::DuplicateLogicalId(id));
        }
        debug!(
            "Declared {} ({})",
            id,
            resource.resource_type().as_str()
        );
        self.resources.insert(id.clone(), resource);
        Ok(id)
    }

    /// Declare a deploy-time parameter
    pub fn add_parameter(&mut self, id: LogicalId, parameter: Parameter) -> StackResult<LogicalId> {
        if self.is_declared(&id) {
            return Err(StackError::DuplicateLogicalId(id));
        }
        self.parameters.insert(id.clone(), parameter);
        Ok(id)
    }

    /// Declare an output; `name` is sanitized into a logical id
    pub fn add_output(
        &mut self,
        name: &str,
        value: Value,
        description: Option<String>,
    ) -> StackResult<LogicalId> {
        let id = LogicalId::sanitize(name)?;
        if self.outputs.contains_key(&id) {
            return Err(StackError::DuplicateLogicalId(id));
        }
        self.outputs.insert(id.clone(), Output { value, description });
        Ok(id)
    }

    /// Record an explicit ordering hint: `from` is created after `to`
    pub fn add_dependency(&mut self, from: &LogicalId, to: &LogicalId) -> StackResult<()> {
        if !self.resources.contains_key(to) {
            return Err(StackError::UnknownReference {
                from: from.clone(),
                to: to.clone(),
            });
        }
        if from == to {
            return Err(StackError::SelfDependency(from.clone()));
        }
        let resource = self
            .resources
            .get_mut(from)
            .ok_or_else(|| StackError::UnknownResource(from.clone()))?;
        resource.insert_dependency(to.clone());
        Ok(())
    }

    fn is_declared(&self, id: &LogicalId) -> bool {
        self.resources.contains_key(id) || self.parameters.contains_key(id)
    }

    pub fn resource(&self, id: &LogicalId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resource_mut(&mut self, id: &LogicalId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn resources_of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &Resource> {
        self.resources
            .values()
            .filter(move |r| r.resource_type() == resource_type)
    }

    pub fn has_parameter(&self, id: &LogicalId) -> bool {
        self.parameters.contains_key(id)
    }

    pub fn parameters(&self) -> &BTreeMap<LogicalId, Parameter> {
        &self.parameters
    }

    pub fn output(&self, id: &LogicalId) -> Option<&Output> {
        self.outputs.get(id)
    }

    pub fn outputs(&self) -> &BTreeMap<LogicalId, Output> {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_duplicate_logical_id_rejected() {
        let mut stack = Stack::new("test");
        stack.add(Resource::new(id("Vpc"), ResourceType::Vpc)).unwrap();
        let err = stack
            .add(Resource::new(id("Vpc"), ResourceType::Subnet))
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateLogicalId(_)));

        let err = stack
            .add_parameter(id("Vpc"), Parameter::string("clash"))
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateLogicalId(_)));
    }

    #[test]
    fn test_add_dependency() {
        let mut stack = Stack::new("test");
        let group = stack
            .add(Resource::new(id("Group"), ResourceType::NeptuneDbSubnetGroup))
            .unwrap();
        let cluster = stack
            .add(Resource::new(id("Cluster"), ResourceType::NeptuneDbCluster))
            .unwrap();

        stack.add_dependency(&cluster, &group).unwrap();
        assert!(stack.resource(&cluster).unwrap().depends_on().contains(&group));

        assert!(matches!(
            stack.add_dependency(&cluster, &cluster),
            Err(StackError::SelfDependency(_))
        ));
        assert!(matches!(
            stack.add_dependency(&cluster, &id("Missing")),
            Err(StackError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_output_name_is_sanitized() {
        let mut stack = Stack::new("test");
        let out = stack
            .add_output("Neptune Endpoint", Value::str("x"), None)
            .unwrap();
        assert_eq!(out.as_str(), "NeptuneEndpoint");
        assert!(stack.output(&out).is_some());
    }

    #[test]
    fn test_resources_of_type() {
        let mut stack = Stack::new("test");
        stack.add(Resource::new(id("A"), ResourceType::Subnet)).unwrap();
        stack.add(Resource::new(id("B"), ResourceType::Subnet)).unwrap();
        stack.add(Resource::new(id("C"), ResourceType::Vpc)).unwrap();
        assert_eq!(stack.resources_of_type(ResourceType::Subnet).count(), 2);
        assert_eq!(stack.len(), 3);
    }
}
