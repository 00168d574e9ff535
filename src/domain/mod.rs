// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph Domain Models
//!
//! Core vocabulary for declaring provider resources: identifiers, resource
//! types, network value objects, and the structural invariants the graph
//! must satisfy.
//!
//! # Value Objects with Invariants
//!
//! - [`LogicalId`] - Template logical ids (alphanumeric, ≤ 255)
//! - [`Cidr`] - Aligned IPv4 network blocks (/16 to /28)
//! - [`Port`] - Protocol and port range of a traffic rule
//! - [`SubnetType`] - Public, private-with-egress, or isolated tier
//! - [`ResourceType`] - Provider resource taxonomy

pub mod invariants;
pub mod logical_id;
pub mod network;
pub mod resource_type;

pub use invariants::{ValidationError, ValidationResult};
pub use logical_id::{LogicalId, LogicalIdError};
pub use network::{Cidr, NetworkError, Port, Protocol, SubnetType};
pub use resource_type::{ResourceCategory, ResourceType};
