// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Database Constructs
//!
//! The subnet group, cluster and instance reference each other by physical
//! name. Those references are [`Value::NameOf`], so the caller has to add
//! the explicit dependencies (`cluster → subnet group`,
//! `instance → cluster`); the graph refuses to synthesize without them.

use crate::domain::{LogicalId, ResourceType};
use crate::errors::StackResult;
use crate::stack::{Resource, Stack, Value};

/// Subnet group declaration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSubnetGroupProps {
    pub name: String,
    pub description: String,
    pub subnet_ids: Vec<LogicalId>,
}

/// A declared subnet group
#[derive(Debug, Clone)]
pub struct DbSubnetGroup {
    id: LogicalId,
    name: String,
}

impl DbSubnetGroup {
    pub fn new(stack: &mut Stack, id: &str, props: DbSubnetGroupProps) -> StackResult<Self> {
        let group_id = LogicalId::sanitize(id)?;
        let subnets = props.subnet_ids.iter().map(Value::reference).collect();
        stack.add(
            Resource::new(group_id.clone(), ResourceType::NeptuneDbSubnetGroup)
                .with_property("DBSubnetGroupDescription", props.description.as_str())
                .with_property("SubnetIds", Value::List(subnets))
                .with_property("DBSubnetGroupName", props.name.as_str()),
        )?;
        Ok(Self {
            id: group_id,
            name: props.name,
        })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's physical name, as seen by resources that use it
    pub fn name_ref(&self) -> Value {
        Value::NameOf {
            target: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Cluster declaration options
#[derive(Debug, Clone, PartialEq)]
pub struct DbClusterProps {
    pub identifier: String,
    pub subnet_group_name: Value,
    pub security_group_ids: Vec<Value>,
}

/// A declared cluster
#[derive(Debug, Clone)]
pub struct DbCluster {
    id: LogicalId,
    identifier: String,
}

impl DbCluster {
    pub fn new(stack: &mut Stack, id: &str, props: DbClusterProps) -> StackResult<Self> {
        let cluster_id = LogicalId::sanitize(id)?;
        stack.add(
            Resource::new(cluster_id.clone(), ResourceType::NeptuneDbCluster)
                .with_property("DBSubnetGroupName", props.subnet_group_name)
                .with_property("DBClusterIdentifier", props.identifier.as_str())
                .with_property("VpcSecurityGroupIds", Value::List(props.security_group_ids)),
        )?;
        Ok(Self {
            id: cluster_id,
            identifier: props.identifier,
        })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The cluster identifier, as seen by resources that use it
    pub fn identifier_ref(&self) -> Value {
        Value::NameOf {
            target: self.id.clone(),
            name: self.identifier.clone(),
        }
    }

    /// Writer endpoint generated by the provider
    pub fn endpoint(&self) -> Value {
        Value::get_att(&self.id, "Endpoint")
    }

    /// Reader endpoint generated by the provider
    pub fn read_endpoint(&self) -> Value {
        Value::get_att(&self.id, "ReadEndpoint")
    }

    /// Port generated by the provider
    pub fn port(&self) -> Value {
        Value::get_att(&self.id, "Port")
    }
}

/// Instance declaration options
#[derive(Debug, Clone, PartialEq)]
pub struct DbInstanceProps {
    pub instance_class: String,
    pub cluster_identifier: Value,
    pub availability_zone: Option<Value>,
}

/// A declared instance
#[derive(Debug, Clone)]
pub struct DbInstance {
    id: LogicalId,
}

impl DbInstance {
    pub fn new(stack: &mut Stack, id: &str, props: DbInstanceProps) -> StackResult<Self> {
        let instance_id = LogicalId::sanitize(id)?;
        let mut resource = Resource::new(instance_id.clone(), ResourceType::NeptuneDbInstance)
            .with_property("DBInstanceClass", props.instance_class.as_str())
            .with_property("DBClusterIdentifier", props.cluster_identifier);
        if let Some(zone) = props.availability_zone {
            resource.set_property("AvailabilityZone", zone);
        }
        stack.add(resource)?;
        Ok(Self { id: instance_id })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }
}
