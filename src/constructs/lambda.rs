// Copyright (c) 2025 - Cowboy AI, Inc.
//! Serverless Function Construct
//!
//! Declares a function together with its execution role. Functions placed
//! in a VPC also get the VPC access managed policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{LogicalId, ResourceType};
use crate::errors::StackResult;
use crate::stack::{PseudoParameter, Resource, Stack, Value};

/// Function runtime identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Runtime {
    #[serde(rename = "nodejs10.x")]
    Nodejs10x,
    #[serde(rename = "nodejs18.x")]
    Nodejs18x,
    #[serde(rename = "nodejs20.x")]
    Nodejs20x,
    #[serde(rename = "python3.12")]
    Python312,
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nodejs10x => "nodejs10.x",
            Self::Nodejs18x => "nodejs18.x",
            Self::Nodejs20x => "nodejs20.x",
            Self::Python312 => "python3.12",
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the function's code package comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// Local directory uploaded to the asset bucket named by a parameter
    Asset { path: String, bucket: LogicalId },
    /// Source inlined in the template
    Inline(String),
}

impl Code {
    /// Object key the asset directory is uploaded under
    pub fn asset_key(path: &str) -> String {
        let trimmed = path.trim_matches('/');
        format!("assets/{}.zip", trimmed.replace('/', "-"))
    }

    fn to_value(&self) -> Value {
        match self {
            Code::Asset { path, bucket } => Value::map([
                ("S3Bucket", Value::reference(bucket)),
                ("S3Key", Value::str(Self::asset_key(path))),
            ]),
            Code::Inline(source) => Value::map([("ZipFile", Value::str(source.as_str()))]),
        }
    }
}

/// Network placement of a function
#[derive(Debug, Clone, PartialEq)]
pub struct VpcPlacement {
    pub subnet_ids: Vec<LogicalId>,
    pub security_group_ids: Vec<Value>,
}

/// Function declaration options
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProps {
    pub runtime: Runtime,
    pub code: Code,
    pub handler: String,
    pub vpc: Option<VpcPlacement>,
    pub environment: BTreeMap<String, Value>,
}

/// A declared function
#[derive(Debug, Clone)]
pub struct Function {
    id: LogicalId,
    role: LogicalId,
}

fn managed_policy(name: &str) -> Value {
    Value::concat(vec![
        Value::str("arn:"),
        PseudoParameter::Partition.into(),
        Value::str(format!(":iam::aws:policy/service-role/{}", name)),
    ])
}

impl Function {
    pub fn new(stack: &mut Stack, id: &str, props: FunctionProps) -> StackResult<Self> {
        let function_id = LogicalId::sanitize(id)?;
        let role_id = function_id.child("ServiceRole")?;

        let mut policies = vec![managed_policy("AWSLambdaBasicExecutionRole")];
        if props.vpc.is_some() {
            policies.push(managed_policy("AWSLambdaVPCAccessExecutionRole"));
        }

        stack.add(
            Resource::new(role_id.clone(), ResourceType::IamRole)
                .with_property(
                    "AssumeRolePolicyDocument",
                    Value::map([
                        (
                            "Statement",
                            Value::List(vec![Value::map([
                                ("Action", Value::str("sts:AssumeRole")),
                                ("Effect", Value::str("Allow")),
                                (
                                    "Principal",
                                    Value::map([("Service", Value::str("lambda.amazonaws.com"))]),
                                ),
                            ])]),
                        ),
                        ("Version", Value::str("2012-10-17")),
                    ]),
                )
                .with_property("ManagedPolicyArns", Value::List(policies)),
        )?;

        // The role's policies must be attached before the function is created
        let mut resource = Resource::new(function_id.clone(), ResourceType::LambdaFunction)
            .with_property("Code", props.code.to_value())
            .with_property("Role", Value::get_att(&role_id, "Arn"))
            .with_property("Handler", props.handler.as_str())
            .with_property("Runtime", props.runtime.as_str())
            .with_dependency(&role_id);

        if !props.environment.is_empty() {
            resource.set_property(
                "Environment",
                Value::map([("Variables", Value::Map(props.environment))]),
            );
        }

        if let Some(placement) = props.vpc {
            resource.set_property(
                "VpcConfig",
                Value::map([
                    (
                        "SecurityGroupIds",
                        Value::List(placement.security_group_ids),
                    ),
                    (
                        "SubnetIds",
                        Value::List(placement.subnet_ids.iter().map(Value::reference).collect()),
                    ),
                ]),
            );
        }

        stack.add(resource)?;
        Ok(Self {
            id: function_id,
            role: role_id,
        })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn role(&self) -> &LogicalId {
        &self.role
    }

    /// `Fn::GetAtt Arn` of the function
    pub fn arn(&self) -> Value {
        Value::get_att(&self.id, "Arn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyGraph, EdgeKind};
    use crate::stack::Parameter;
    use test_case::test_case;

    #[test_case("lambdas/lambda1", "assets/lambdas-lambda1.zip" ; "nested")]
    #[test_case("/handler/", "assets/handler.zip" ; "slashes trimmed")]
    fn test_asset_key(path: &str, expected: &str) {
        assert_eq!(Code::asset_key(path), expected);
    }

    #[test]
    fn test_function_depends_on_role() {
        let mut stack = Stack::new("test");
        let bucket = stack
            .add_parameter(
                LogicalId::new("AssetBucket").unwrap(),
                Parameter::string("bucket"),
            )
            .unwrap();
        let function = Function::new(
            &mut stack,
            "Lambda",
            FunctionProps {
                runtime: Runtime::Nodejs10x,
                code: Code::Asset {
                    path: "lambdas/lambda1".to_string(),
                    bucket,
                },
                handler: "index.handler".to_string(),
                vpc: None,
                environment: BTreeMap::new(),
            },
        )
        .unwrap();

        let graph = DependencyGraph::build(&stack).unwrap();
        assert!(graph.has_edge_of_kind(function.id(), function.role(), EdgeKind::Explicit));
        assert!(graph.has_edge_of_kind(function.id(), function.role(), EdgeKind::Reference));

        let resource = stack.resource(function.id()).unwrap();
        assert!(resource.property("Environment").is_none());
        assert!(resource.property("VpcConfig").is_none());

        let role = stack.resource(function.role()).unwrap();
        let policies = role
            .property("ManagedPolicyArns")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(policies.len(), 1);
    }

    #[test]
    fn test_runtime_serde_name() {
        let runtime: Runtime = serde_json::from_str("\"nodejs10.x\"").unwrap();
        assert_eq!(runtime, Runtime::Nodejs10x);
        assert_eq!(runtime.to_string(), "nodejs10.x");
    }
}
