// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for declaring, checking and synthesizing the resource graph

use thiserror::Error;

use crate::domain::{LogicalId, LogicalIdError, NetworkError, ValidationError};

/// Errors that can occur while building or synthesizing a stack
#[derive(Debug, Error)]
pub enum StackError {
    /// Two resources share a logical id
    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(LogicalId),

    /// A logical id could not be validated
    #[error("Invalid logical id: {0}")]
    InvalidLogicalId(#[from] LogicalIdError),

    /// No resource is declared under this logical id
    #[error("Unknown resource: {0}")]
    UnknownResource(LogicalId),

    /// A resource references something that is not declared in the stack
    #[error("Resource {from} references unknown resource {to}")]
    UnknownReference { from: LogicalId, to: LogicalId },

    /// A resource names another resource without an explicit ordering hint
    #[error("Resource {from} refers to {to} by name but does not depend on it")]
    MissingExplicitDependency { from: LogicalId, to: LogicalId },

    /// A resource depends on itself
    #[error("Resource {0} depends on itself")]
    SelfDependency(LogicalId),

    /// The dependency graph is not acyclic
    #[error("Dependency cycle: {}", format_cycle(.0))]
    DependencyCycle(Vec<LogicalId>),

    /// Network value object error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Structural invariant failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::Serialization(err.to_string())
    }
}

fn format_cycle(cycle: &[LogicalId]) -> String {
    cycle
        .iter()
        .map(LogicalId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
