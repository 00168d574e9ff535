// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Synthesis
//!
//! Turns a checked [`Stack`] into the template document the orchestration
//! engine consumes. Synthesis refuses any stack whose dependency graph does
//! not validate, so a template that comes out of here has no forward
//! references, no unhinted name references and no cycles.
//!
//! Key order in the emitted JSON is deterministic (sorted), so two
//! synthesis runs over the same declarations produce identical bytes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::errors::StackResult;
use crate::graph::DependencyGraph;
use crate::stack::{Parameter, Stack};

/// Template format version understood by the engine
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// One resource entry of a template
///
/// Resource attributes this crate never emits (`Condition`,
/// `DeletionPolicy`, `UpdateReplacePolicy`, `Metadata`, ...) are kept in
/// `attributes` so a deployed template survives a read-back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// `DependsOn` may be a single logical id or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

/// One output entry of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Synthesized template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(
        rename = "Description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        rename = "Parameters",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, TemplateResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

impl Template {
    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> StackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously synthesized or deployed template
    pub fn from_json(json: &str) -> StackResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resource(&self, id: &str) -> Option<&TemplateResource> {
        self.resources.get(id)
    }
}

/// Validate the graph and render the stack as a template
pub fn synthesize(stack: &Stack) -> StackResult<Template> {
    let graph = DependencyGraph::build(stack)?;

    let resources = stack
        .resources()
        .map(|resource| {
            let properties = resource
                .properties()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect();
            let depends_on = resource
                .depends_on()
                .iter()
                .map(|id| id.as_str().to_string())
                .collect();
            (
                resource.logical_id().as_str().to_string(),
                TemplateResource {
                    resource_type: resource.resource_type().as_str().to_string(),
                    properties,
                    depends_on,
                    attributes: BTreeMap::new(),
                },
            )
        })
        .collect();

    let parameters = stack
        .parameters()
        .iter()
        .map(|(id, parameter)| (id.as_str().to_string(), parameter.clone()))
        .collect();

    let outputs = stack
        .outputs()
        .iter()
        .map(|(id, output)| {
            (
                id.as_str().to_string(),
                TemplateOutput {
                    value: output.value.to_json(),
                    description: output.description.clone(),
                },
            )
        })
        .collect();

    info!(
        "Synthesized stack {}: {} resources in {} waves",
        stack.name(),
        graph.len(),
        graph.waves().len()
    );

    Ok(Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: stack.description().map(str::to_string),
        parameters,
        resources,
        outputs,
    })
}
