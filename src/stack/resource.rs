// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared resource

use std::collections::{BTreeMap, BTreeSet};

use super::Value;
use crate::domain::{LogicalId, ResourceType};

/// One provider resource declaration
///
/// # Invariants
/// - `depends_on` never contains the resource's own id (checked by the graph)
/// - Every name reference should be matched by an entry in `depends_on`
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    logical_id: LogicalId,
    resource_type: ResourceType,
    properties: BTreeMap<String, Value>,
    depends_on: BTreeSet<LogicalId>,
}

impl Resource {
    pub fn new(logical_id: LogicalId, resource_type: ResourceType) -> Self {
        Self {
            logical_id,
            resource_type,
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Set a property, builder style
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Add an explicit dependency, builder style
    pub fn with_dependency(mut self, id: &LogicalId) -> Self {
        self.depends_on.insert(id.clone());
        self
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Add or replace a `{Key, Value}` entry in the `Tags` property
    pub fn add_tag(&mut self, key: &str, value: &str) {
        let tag = Value::map([("Key", Value::str(key)), ("Value", Value::str(value))]);
        let mut tags = match self.properties.remove("Tags") {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        };
        tags.retain(|t| t.field("Key").and_then(Value::as_literal_str) != Some(key));
        tags.push(tag);
        tags.sort_by(|a, b| {
            let key_of = |v: &Value| v.field("Key").and_then(Value::as_literal_str).map(str::to_owned);
            key_of(a).cmp(&key_of(b))
        });
        self.properties.insert("Tags".to_string(), Value::List(tags));
    }

    /// Add a tag, builder style
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.add_tag(key, value);
        self
    }

    /// Value of a tag, if set
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.property("Tags")?
            .as_list()?
            .iter()
            .find(|t| t.field("Key").and_then(Value::as_literal_str) == Some(key))?
            .field("Value")?
            .as_literal_str()
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn depends_on(&self) -> &BTreeSet<LogicalId> {
        &self.depends_on
    }

    pub(crate) fn insert_dependency(&mut self, id: LogicalId) -> bool {
        self.depends_on.insert(id)
    }

    /// Ids this resource reads data from
    pub fn references(&self) -> BTreeSet<LogicalId> {
        self.properties
            .values()
            .flat_map(Value::references)
            .collect()
    }

    /// Ids this resource names through literal strings only
    pub fn name_references(&self) -> BTreeSet<LogicalId> {
        self.properties
            .values()
            .flat_map(Value::name_references)
            .collect()
    }
}
