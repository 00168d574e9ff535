// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Resource Constructs
//!
//! Each construct declares one or more provider resources into a
//! [`Stack`](crate::stack::Stack) and hands back a small handle carrying the
//! logical ids and attribute accessors other constructs need.
//!
//! - [`vpc`] - network boundary, subnet tiers, route tables, gateways
//! - [`security_group`] - access-control group and ingress rules
//! - [`neptune`] - graph database subnet group, cluster and instance
//! - [`lambda`] - function and execution role
//! - [`apigateway`] - proxy REST API in front of a function

pub mod apigateway;
pub mod lambda;
pub mod neptune;
pub mod security_group;
pub mod vpc;

pub use apigateway::{LambdaRestApi, LambdaRestApiProps};
pub use lambda::{Code, Function, FunctionProps, Runtime, VpcPlacement};
pub use neptune::{
    DbCluster, DbClusterProps, DbInstance, DbInstanceProps, DbSubnetGroup, DbSubnetGroupProps,
};
pub use security_group::{Peer, SecurityGroup, SecurityGroupProps};
pub use vpc::{Subnet, SubnetConfiguration, Vpc, VpcProps};
