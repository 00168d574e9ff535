// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property Values and Intrinsic Functions
//!
//! A [`Value`] is what a resource property is declared as. Besides plain
//! literals it carries the intrinsic functions of the template format, and
//! those are what create the implicit edges of the resource graph:
//!
//! ```text
//! Value::Ref(id)            → {"Ref": id}                 implicit edge
//! Value::GetAtt(id, attr)   → {"Fn::GetAtt": [id, attr]}  implicit edge
//! Value::NameOf{target,..}  → "literal-name"              NO edge, needs DependsOn
//! ```

use serde::{Serialize, Serializer};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::LogicalId;

/// Pseudo parameters supplied by the orchestration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoParameter {
    AccountId,
    Partition,
    Region,
    StackName,
    UrlSuffix,
}

impl PseudoParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountId => "AWS::AccountId",
            Self::Partition => "AWS::Partition",
            Self::Region => "AWS::Region",
            Self::StackName => "AWS::StackName",
            Self::UrlSuffix => "AWS::URLSuffix",
        }
    }
}

impl fmt::Display for PseudoParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain JSON literal
    Literal(serde_json::Value),
    /// `Ref` to a resource or parameter
    Ref(LogicalId),
    /// `Fn::GetAtt` on a resource
    GetAtt(LogicalId, String),
    /// `Ref` to an engine pseudo parameter
    Pseudo(PseudoParameter),
    /// `Fn::Join` with a delimiter
    Join(String, Vec<Value>),
    /// `Fn::Select` of one element of a list
    Select(usize, Box<Value>),
    /// `Fn::GetAZs` for the current region
    AvailabilityZones,
    /// List of values
    List(Vec<Value>),
    /// Object of values
    Map(BTreeMap<String, Value>),
    /// Literal physical name that identifies another resource
    ///
    /// The engine sees only the string, so the dependency on `target` has
    /// to be declared explicitly.
    NameOf { target: LogicalId, name: String },
}

impl Value {
    /// String literal
    pub fn str(s: impl Into<String>) -> Self {
        Value::Literal(serde_json::Value::String(s.into()))
    }

    /// `Ref` to a logical id
    pub fn reference(id: &LogicalId) -> Self {
        Value::Ref(id.clone())
    }

    /// `Fn::GetAtt` on a logical id
    pub fn get_att(id: &LogicalId, attribute: &str) -> Self {
        Value::GetAtt(id.clone(), attribute.to_string())
    }

    /// `Fn::Join` with an empty delimiter
    pub fn concat(parts: Vec<Value>) -> Self {
        Value::Join(String::new(), parts)
    }

    /// The `index`-th availability zone of the region
    pub fn availability_zone(index: usize) -> Self {
        Value::Select(index, Box::new(Value::AvailabilityZones))
    }

    /// Object from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Get the literal string, if this is one
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Value::Literal(serde_json::Value::String(s)) => Some(s),
            Value::NameOf { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Get a list's elements, if this is one
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get a field of an object, if this is one
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Logical ids this value reads data from (`Ref` and `Fn::GetAtt`)
    pub fn references(&self) -> BTreeSet<LogicalId> {
        let mut out = BTreeSet::new();
        self.walk(&mut |value: &Value| match value {
            Value::Ref(id) | Value::GetAtt(id, _) => {
                out.insert(id.clone());
            }
            _ => {}
        });
        out
    }

    /// Logical ids this value names only through a literal string
    pub fn name_references(&self) -> BTreeSet<LogicalId> {
        let mut out = BTreeSet::new();
        self.walk(&mut |value: &Value| {
            if let Value::NameOf { target, .. } = value {
                out.insert(target.clone());
            }
        });
        out
    }

    fn walk(&self, visit: &mut dyn FnMut(&Value)) {
        visit(self);
        match self {
            Value::Join(_, parts) | Value::List(parts) => {
                for part in parts {
                    part.walk(visit);
                }
            }
            Value::Select(_, inner) => inner.walk(visit),
            Value::Map(entries) => {
                for value in entries.values() {
                    value.walk(visit);
                }
            }
            _ => {}
        }
    }

    /// Render as template JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Literal(v) => v.clone(),
            Value::Ref(id) => json!({ "Ref": id.as_str() }),
            Value::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id.as_str(), attr] }),
            Value::Pseudo(p) => json!({ "Ref": p.as_str() }),
            Value::Join(delimiter, parts) => json!({
                "Fn::Join": [
                    delimiter,
                    parts.iter().map(Value::to_json).collect::<Vec<_>>()
                ]
            }),
            Value::Select(index, inner) => json!({ "Fn::Select": [index, inner.to_json()] }),
            Value::AvailabilityZones => json!({ "Fn::GetAZs": "" }),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::NameOf { name, .. } => serde_json::Value::String(name.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(serde_json::Value::Bool(b))
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Literal(json!(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<PseudoParameter> for Value {
    fn from(p: PseudoParameter) -> Self {
        Value::Pseudo(p)
    }
}
