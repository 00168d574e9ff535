// Copyright (c) 2025 - Cowboy AI, Inc.
//! Change Sets
//!
//! Compares a previously deployed template with a freshly synthesized one.
//! The engine decides how to patch; this only says what differs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::synth::{Template, TemplateResource};

/// What happens to one logical id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Change {
    Add {
        logical_id: String,
        resource_type: String,
    },
    Modify {
        logical_id: String,
        resource_type: String,
        /// Property keys (and `DependsOn`) whose value differs
        changed: Vec<String>,
        /// The type changed, so the resource is recreated rather than updated
        replacement: bool,
    },
    Remove {
        logical_id: String,
        resource_type: String,
    },
}

impl Change {
    pub fn logical_id(&self) -> &str {
        match self {
            Change::Add { logical_id, .. }
            | Change::Modify { logical_id, .. }
            | Change::Remove { logical_id, .. } => logical_id,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Add {
                logical_id,
                resource_type,
            } => write!(f, "+ {} ({})", logical_id, resource_type),
            Change::Modify {
                logical_id,
                resource_type,
                changed,
                replacement,
            } => {
                write!(f, "~ {} ({}) [{}]", logical_id, resource_type, changed.join(", "))?;
                if *replacement {
                    write!(f, " requires replacement")?;
                }
                Ok(())
            }
            Change::Remove {
                logical_id,
                resource_type,
            } => write!(f, "- {} ({})", logical_id, resource_type),
        }
    }
}

/// Ordered set of changes between two templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub id: Uuid,
    pub changes: Vec<Change>,
    /// Output names whose value differs, appears or disappears
    pub changed_outputs: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.changed_outputs.is_empty()
    }

    pub fn change(&self, logical_id: &str) -> Option<&Change> {
        self.changes.iter().find(|c| c.logical_id() == logical_id)
    }
}

fn changed_keys(previous: &TemplateResource, desired: &TemplateResource) -> Vec<String> {
    let keys: BTreeSet<&String> = previous
        .properties
        .keys()
        .chain(desired.properties.keys())
        .collect();
    let mut changed: Vec<String> = keys
        .into_iter()
        .filter(|key| previous.properties.get(*key) != desired.properties.get(*key))
        .cloned()
        .collect();

    let attributes: BTreeSet<&String> = previous
        .attributes
        .keys()
        .chain(desired.attributes.keys())
        .collect();
    changed.extend(
        attributes
            .into_iter()
            .filter(|key| previous.attributes.get(*key) != desired.attributes.get(*key))
            .cloned(),
    );

    let before: BTreeSet<&String> = previous.depends_on.iter().collect();
    let after: BTreeSet<&String> = desired.depends_on.iter().collect();
    if before != after {
        changed.push("DependsOn".to_string());
    }
    changed
}

/// Diff `desired` against what is deployed (`None` for a fresh stack)
pub fn plan(previous: Option<&Template>, desired: &Template) -> ChangeSet {
    let mut changes = Vec::new();

    for (id, resource) in &desired.resources {
        match previous.and_then(|p| p.resources.get(id)) {
            None => changes.push(Change::Add {
                logical_id: id.clone(),
                resource_type: resource.resource_type.clone(),
            }),
            Some(old) if old == resource => {}
            Some(old) => changes.push(Change::Modify {
                logical_id: id.clone(),
                resource_type: resource.resource_type.clone(),
                changed: changed_keys(old, resource),
                replacement: old.resource_type != resource.resource_type,
            }),
        }
    }

    let changed_outputs = if let Some(previous) = previous {
        for (id, resource) in &previous.resources {
            if !desired.resources.contains_key(id) {
                changes.push(Change::Remove {
                    logical_id: id.clone(),
                    resource_type: resource.resource_type.clone(),
                });
            }
        }
        let names: BTreeSet<&String> = previous
            .outputs
            .keys()
            .chain(desired.outputs.keys())
            .collect();
        names
            .into_iter()
            .filter(|name| previous.outputs.get(*name) != desired.outputs.get(*name))
            .cloned()
            .collect()
    } else {
        desired.outputs.keys().cloned().collect()
    };

    ChangeSet {
        id: Uuid::now_v7(),
        changes,
        changed_outputs,
    }
}
