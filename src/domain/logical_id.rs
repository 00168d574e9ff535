// Copyright (c) 2025 - Cowboy AI, Inc.
//! Logical Id Value Object with Template Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical id validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogicalIdError {
    #[error("Logical id is empty")]
    Empty,

    #[error("Logical id exceeds maximum length of 255 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in logical id: {0:?}")]
    InvalidCharacter(char),
}

/// Template logical id value object
///
/// Names a resource, parameter or output inside a single template.
/// Invariants:
/// - Non-empty
/// - At most 255 characters
/// - ASCII alphanumeric only
///
/// # Examples
///
/// ```rust
/// use neptune_stack::domain::LogicalId;
///
/// let id = LogicalId::new("MyCluster").unwrap();
/// assert_eq!(id.as_str(), "MyCluster");
///
/// assert!(LogicalId::new("").is_err());
/// assert!(LogicalId::new("my-cluster").is_err());
///
/// let output = LogicalId::sanitize("Neptune Endpoint").unwrap();
/// assert_eq!(output.as_str(), "NeptuneEndpoint");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Maximum length accepted by the template format
    pub const MAX_LENGTH: usize = 255;

    /// Create a new logical id with validation
    pub fn new(id: impl Into<String>) -> Result<Self, LogicalIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(LogicalIdError::Empty);
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(LogicalIdError::TooLong(id.len()));
        }

        if let Some(ch) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(LogicalIdError::InvalidCharacter(ch));
        }

        Ok(Self(id))
    }

    /// Derive a logical id from a free-form construct name
    ///
    /// Every character that is not ASCII alphanumeric is dropped.
    pub fn sanitize(name: &str) -> Result<Self, LogicalIdError> {
        let cleaned: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
        Self::new(cleaned)
    }

    /// Build the id of a child construct (`parent` + `child`)
    pub fn child(&self, child: &str) -> Result<Self, LogicalIdError> {
        Self::sanitize(&format!("{}{}", self.0, child))
    }

    /// Get the logical id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LogicalId {
    type Err = LogicalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LogicalId {
    type Error = LogicalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
