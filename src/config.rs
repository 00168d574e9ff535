// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Configuration
//!
//! Every name, size and class the application declares comes from
//! [`StackConfig`]. The defaults reproduce the reference deployment; a JSON
//! file may override any subset of fields and a handful of `NEPTUNE_*`
//! environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::constructs::Runtime;
use crate::domain::{Cidr, SubnetType};
use crate::errors::{StackError, StackResult};

/// Environment variable overriding [`StackConfig::stack_name`]
pub const ENV_STACK_NAME: &str = "NEPTUNE_STACK_NAME";
/// Environment variable overriding [`StackConfig::vpc_cidr`]
pub const ENV_VPC_CIDR: &str = "NEPTUNE_VPC_CIDR";
/// Environment variable overriding [`StackConfig::max_azs`]
pub const ENV_MAX_AZS: &str = "NEPTUNE_MAX_AZS";
/// Environment variable overriding [`StackConfig::db_port`]
pub const ENV_DB_PORT: &str = "NEPTUNE_DB_PORT";
/// Environment variable overriding [`StackConfig::instance_class`]
pub const ENV_INSTANCE_CLASS: &str = "NEPTUNE_INSTANCE_CLASS";
/// Environment variable overriding [`StackConfig::cluster_identifier`]
pub const ENV_CLUSTER_ID: &str = "NEPTUNE_CLUSTER_ID";

/// Declaration parameters of the application stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub stack_name: String,
    pub description: Option<String>,

    // Network boundary
    pub vpc_id: String,
    pub vpc_cidr: Cidr,
    pub max_azs: usize,
    pub subnet_name: String,
    pub subnet_type: SubnetType,
    pub subnet_cidr_mask: u8,

    // Access control
    pub security_group_id: String,
    pub security_group_name: String,
    pub security_group_description: String,
    pub security_group_tag: String,
    pub ingress_description: String,
    pub db_port: u16,

    // Database
    pub subnet_group_id: String,
    pub subnet_group_name: String,
    pub subnet_group_description: String,
    pub cluster_id: String,
    pub cluster_identifier: String,
    pub instance_id: String,
    pub instance_class: String,

    // Function and front door
    pub function_id: String,
    pub runtime: Runtime,
    pub handler: String,
    pub code_path: String,
    pub asset_bucket_parameter: String,
    pub endpoint_env_var: String,
    pub api_id: String,
    pub stage_name: String,

    pub output_name: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: "Step00NeptuneLambdaStack".to_string(),
            description: None,
            vpc_id: "Vpc".to_string(),
            vpc_cidr: Cidr::default(),
            max_azs: 2,
            subnet_name: "Ingress".to_string(),
            subnet_type: SubnetType::PrivateIsolated,
            subnet_cidr_mask: 24,
            security_group_id: "mySecurityGroup1".to_string(),
            security_group_name: "mySecurityGroup".to_string(),
            security_group_description: "security group 1".to_string(),
            security_group_tag: "mySecurityGroup".to_string(),
            ingress_description: "MyRule".to_string(),
            db_port: 8182,
            subnet_group_id: "neptuneSubnetGroup".to_string(),
            subnet_group_name: "mysubnetgroup".to_string(),
            subnet_group_description: "My Subnet".to_string(),
            cluster_id: "MyCluster".to_string(),
            cluster_identifier: "myDbCluster".to_string(),
            instance_id: "myinstance".to_string(),
            instance_class: "db.t3.medium".to_string(),
            function_id: "Lambda".to_string(),
            runtime: Runtime::Nodejs10x,
            handler: "index.handler".to_string(),
            code_path: "lambdas/lambda1".to_string(),
            asset_bucket_parameter: "AssetBucket".to_string(),
            endpoint_env_var: "NEPTUNE_ENDPOINT".to_string(),
            api_id: "api".to_string(),
            stage_name: "prod".to_string(),
            output_name: "Neptune Endpoint".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> StackResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| StackError::Configuration(format!("{} has an invalid value: {:?}", name, raw)))
}

impl StackConfig {
    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> StackResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StackError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&raw)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override fields from the process environment
    pub fn apply_env(self) -> StackResult<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from any variable lookup
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> StackResult<Self> {
        if let Some(value) = lookup(ENV_STACK_NAME) {
            self.stack_name = value;
        }
        if let Some(value) = lookup(ENV_VPC_CIDR) {
            self.vpc_cidr = Cidr::new(value.trim())?;
        }
        if let Some(value) = lookup(ENV_MAX_AZS) {
            self.max_azs = parse_env(ENV_MAX_AZS, &value)?;
        }
        if let Some(value) = lookup(ENV_DB_PORT) {
            self.db_port = parse_env(ENV_DB_PORT, &value)?;
        }
        if let Some(value) = lookup(ENV_INSTANCE_CLASS) {
            self.instance_class = value;
        }
        if let Some(value) = lookup(ENV_CLUSTER_ID) {
            self.cluster_identifier = value;
        }
        Ok(self)
    }

    /// Check the values the constructs cannot check on their own
    pub fn validate(&self) -> StackResult<()> {
        if self.stack_name.trim().is_empty() {
            return Err(StackError::Configuration("Stack name is empty".to_string()));
        }
        if self.max_azs == 0 {
            return Err(StackError::Configuration(
                "At least one availability zone is required".to_string(),
            ));
        }
        if self.db_port == 0 {
            return Err(StackError::Configuration("Database port must be positive".to_string()));
        }
        let capacity = self.vpc_cidr.subnet_capacity(self.subnet_cidr_mask)?;
        if (capacity as usize) < self.max_azs {
            return Err(StackError::Configuration(format!(
                "{} holds {} /{} subnets, {} availability zones need more",
                self.vpc_cidr, capacity, self.subnet_cidr_mask, self.max_azs
            )));
        }
        if self.cluster_identifier.trim().is_empty() || self.subnet_group_name.trim().is_empty() {
            return Err(StackError::Configuration(
                "Database names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = StackConfig::default();
        config.validate().unwrap();
        assert_eq!(config.db_port, 8182);
        assert_eq!(config.subnet_type, SubnetType::PrivateIsolated);
        assert_eq!(config.vpc_cidr.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: StackConfig =
            serde_json::from_str(r#"{ "instance_class": "db.r5.large", "subnet_type": "PUBLIC" }"#)
                .unwrap();
        assert_eq!(config.instance_class, "db.r5.large");
        assert_eq!(config.subnet_type, SubnetType::Public);
        assert_eq!(config.cluster_identifier, "myDbCluster");
    }

    #[test]
    fn test_overrides() {
        let config = StackConfig::default()
            .apply_overrides(lookup(&[
                (ENV_MAX_AZS, "3"),
                (ENV_VPC_CIDR, "172.16.0.0/20"),
                (ENV_CLUSTER_ID, "otherCluster"),
            ]))
            .unwrap();
        assert_eq!(config.max_azs, 3);
        assert_eq!(config.vpc_cidr.to_string(), "172.16.0.0/20");
        assert_eq!(config.cluster_identifier, "otherCluster");
        assert_eq!(config.stack_name, "Step00NeptuneLambdaStack");
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = StackConfig::default()
            .apply_overrides(lookup(&[(ENV_DB_PORT, "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, StackError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_oversized_tier() {
        let config = StackConfig {
            vpc_cidr: Cidr::new("10.0.0.0/24").unwrap(),
            subnet_cidr_mask: 24,
            max_azs: 2,
            ..StackConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
