// Copyright (c) 2025 - Cowboy AI, Inc.
//! The Application Stack
//!
//! Composes the constructs into the deployed system:
//!
//! ```text
//! Vpc (isolated tier, one /24 per AZ)
//!  ├── SecurityGroup ── ingress TCP 8182 from itself
//!  ├── DbSubnetGroup (isolated subnets)
//!  │    └── DbCluster   DependsOn subnet group
//!  │         └── DbInstance  DependsOn cluster, first AZ
//!  └── Function (isolated subnets, NEPTUNE_ENDPOINT = cluster.Endpoint)
//!       └── LambdaRestApi (ANY / and /{proxy+})
//! Output "Neptune Endpoint" = cluster.Endpoint
//! ```
//!
//! The front door sits outside the VPC while the function has no route out
//! of it; [`crate::reachability::analyze`] reports that path.

use std::collections::BTreeMap;
use tracing::info;

use crate::config::StackConfig;
use crate::constructs::{
    Code, DbCluster, DbClusterProps, DbInstance, DbInstanceProps, DbSubnetGroup,
    DbSubnetGroupProps, Function, FunctionProps, LambdaRestApi, LambdaRestApiProps, Peer,
    SecurityGroup, SecurityGroupProps, SubnetConfiguration, Vpc, VpcPlacement, VpcProps,
};
use crate::domain::invariants::{
    validate_isolated_tier, validate_output_is_attribute, validate_self_referencing_ingress,
    validate_subnet_group_membership,
};
use crate::domain::{LogicalId, Port, ValidationResult};
use crate::errors::StackResult;
use crate::stack::{Parameter, Stack};

/// Attribute of the cluster that carries its writer endpoint
pub const ENDPOINT_ATTRIBUTE: &str = "Endpoint";

/// The declared application with a handle to every part
#[derive(Debug, Clone)]
pub struct NeptuneStack {
    pub stack: Stack,
    pub vpc: Vpc,
    pub security_group: SecurityGroup,
    pub ingress_rule: Option<LogicalId>,
    pub db_port: Port,
    pub subnet_group: DbSubnetGroup,
    pub cluster: DbCluster,
    pub instance: DbInstance,
    pub function: Function,
    pub api: LambdaRestApi,
    pub endpoint_output: LogicalId,
}

impl NeptuneStack {
    /// Logical ids of the subnets the database and function are placed in
    ///
    /// The VPC declares a single tier, so this is every subnet it has.
    pub fn tier_subnets(&self) -> Vec<LogicalId> {
        self.vpc.subnets().iter().map(|s| s.id.clone()).collect()
    }

    /// Run every structural check of the declared graph
    pub fn validate(&self) -> ValidationResult {
        validate_self_referencing_ingress(&self.stack, self.security_group.id(), self.db_port)?;
        validate_isolated_tier(&self.stack, &self.tier_subnets())?;
        validate_subnet_group_membership(&self.stack, self.subnet_group.id(), self.vpc.id())?;
        validate_output_is_attribute(
            &self.stack,
            &self.endpoint_output,
            self.cluster.id(),
            ENDPOINT_ATTRIBUTE,
        )
    }
}

/// Declare the whole application from `config`
pub fn build_stack(config: &StackConfig) -> StackResult<NeptuneStack> {
    config.validate()?;

    let mut stack = Stack::new(config.stack_name.as_str());
    if let Some(description) = &config.description {
        stack = stack.with_description(description.as_str());
    }

    let asset_bucket = stack.add_parameter(
        LogicalId::sanitize(&config.asset_bucket_parameter)?,
        Parameter::string(format!("S3 bucket holding the asset {}", config.code_path)),
    )?;

    // Network boundary: one tier, one subnet per AZ
    let vpc = Vpc::new(
        &mut stack,
        &config.vpc_id,
        VpcProps {
            cidr: config.vpc_cidr,
            max_azs: config.max_azs,
            subnet_configuration: vec![SubnetConfiguration {
                name: config.subnet_name.clone(),
                subnet_type: config.subnet_type,
                cidr_mask: config.subnet_cidr_mask,
            }],
        },
    )?;
    let subnets = vpc.subnet_ids(config.subnet_type);

    // Access control: the group admits the database port from itself only
    let mut security_group = SecurityGroup::new(
        &mut stack,
        &config.security_group_id,
        &vpc,
        SecurityGroupProps {
            description: config.security_group_description.clone(),
            group_name: Some(config.security_group_name.clone()),
            allow_all_outbound: true,
        },
    )?;
    security_group.add_tag(&mut stack, "Name", &config.security_group_tag)?;
    let db_port = Port::tcp(config.db_port);
    let itself = Peer::SecurityGroup(security_group.id().clone());
    let ingress_rule = security_group.add_ingress_rule(
        &mut stack,
        itself,
        db_port,
        &config.ingress_description,
    )?;

    // Database: group, cluster and instance refer to each other by name
    let subnet_group = DbSubnetGroup::new(
        &mut stack,
        &config.subnet_group_id,
        DbSubnetGroupProps {
            name: config.subnet_group_name.clone(),
            description: config.subnet_group_description.clone(),
            subnet_ids: subnets.clone(),
        },
    )?;

    let cluster = DbCluster::new(
        &mut stack,
        &config.cluster_id,
        DbClusterProps {
            identifier: config.cluster_identifier.clone(),
            subnet_group_name: subnet_group.name_ref(),
            security_group_ids: vec![security_group.group_id()],
        },
    )?;
    stack.add_dependency(cluster.id(), subnet_group.id())?;

    let instance = DbInstance::new(
        &mut stack,
        &config.instance_id,
        DbInstanceProps {
            instance_class: config.instance_class.clone(),
            cluster_identifier: cluster.identifier_ref(),
            availability_zone: Some(vpc.availability_zone(0)?),
        },
    )?;
    stack.add_dependency(instance.id(), cluster.id())?;

    // Function in the same tier and group as the database
    let function = Function::new(
        &mut stack,
        &config.function_id,
        FunctionProps {
            runtime: config.runtime,
            code: Code::Asset {
                path: config.code_path.clone(),
                bucket: asset_bucket,
            },
            handler: config.handler.clone(),
            vpc: Some(VpcPlacement {
                subnet_ids: subnets,
                security_group_ids: vec![security_group.group_id()],
            }),
            environment: BTreeMap::from([(config.endpoint_env_var.clone(), cluster.endpoint())]),
        },
    )?;

    let api = LambdaRestApi::new(
        &mut stack,
        &config.api_id,
        &function,
        LambdaRestApiProps {
            name: config.api_id.clone(),
            stage_name: config.stage_name.clone(),
        },
    )?;

    let endpoint_output = stack.add_output(&config.output_name, cluster.endpoint(), None)?;

    info!(
        "Declared stack {} with {} resources",
        stack.name(),
        stack.len()
    );

    Ok(NeptuneStack {
        stack,
        vpc,
        security_group,
        ingress_rule,
        db_port,
        subnet_group,
        cluster,
        instance,
        function,
        api,
        endpoint_output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;

    #[test]
    fn test_default_stack_validates() {
        let app = build_stack(&StackConfig::default()).unwrap();
        app.validate().unwrap();

        assert_eq!(app.tier_subnets().len(), 2);
        assert!(app.ingress_rule.is_some());
        assert_eq!(app.endpoint_output.as_str(), "NeptuneEndpoint");
        assert_eq!(app.stack.resources_of_type(ResourceType::NeptuneDbInstance).count(), 1);
        assert!(app.vpc.internet_gateway().is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StackConfig {
            max_azs: 0,
            ..StackConfig::default()
        };
        assert!(build_stack(&config).is_err());
    }
}
