// Copyright (c) 2025 - Cowboy AI, Inc.
//! HTTP Front Door Construct
//!
//! A REST API that proxies every path and method to one function:
//!
//! ```text
//! RestApi
//!  ├── /            ANY ─┐
//!  └── /{proxy+}    ANY ─┴─ AWS_PROXY → Function
//! Deployment (after both methods) → Stage
//! ```
//!
//! No routing rules, authorization or throttling are declared.

use crate::domain::{LogicalId, ResourceType};
use crate::errors::StackResult;
use crate::stack::{PseudoParameter, Resource, Stack, Value};

use super::lambda::Function;

/// REST API declaration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaRestApiProps {
    pub name: String,
    pub stage_name: String,
}

/// A declared proxy REST API
#[derive(Debug, Clone)]
pub struct LambdaRestApi {
    id: LogicalId,
    proxy_resource: LogicalId,
    methods: Vec<LogicalId>,
    deployment: LogicalId,
    stage: LogicalId,
    stage_name: String,
}

fn invocation_uri(function: &Function) -> Value {
    Value::concat(vec![
        Value::str("arn:"),
        PseudoParameter::Partition.into(),
        Value::str(":apigateway:"),
        PseudoParameter::Region.into(),
        Value::str(":lambda:path/2015-03-31/functions/"),
        function.arn(),
        Value::str("/invocations"),
    ])
}

impl LambdaRestApi {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        function: &Function,
        props: LambdaRestApiProps,
    ) -> StackResult<Self> {
        let api_id = LogicalId::sanitize(id)?;
        let root = Value::get_att(&api_id, "RootResourceId");

        stack.add(
            Resource::new(api_id.clone(), ResourceType::RestApi)
                .with_property("Name", props.name.as_str()),
        )?;

        let proxy_resource = api_id.child("proxy")?;
        stack.add(
            Resource::new(proxy_resource.clone(), ResourceType::ApiResource)
                .with_property("ParentId", root.clone())
                .with_property("PathPart", "{proxy+}")
                .with_property("RestApiId", Value::reference(&api_id)),
        )?;

        let proxy_method = proxy_resource.child("ANY")?;
        let root_method = api_id.child("ANY")?;
        for (method, resource_id) in [
            (&proxy_method, Value::reference(&proxy_resource)),
            (&root_method, root.clone()),
        ] {
            stack.add(
                Resource::new(method.clone(), ResourceType::ApiMethod)
                    .with_property("HttpMethod", "ANY")
                    .with_property("ResourceId", resource_id)
                    .with_property("RestApiId", Value::reference(&api_id))
                    .with_property("AuthorizationType", "NONE")
                    .with_property(
                        "Integration",
                        Value::map([
                            ("IntegrationHttpMethod", Value::str("POST")),
                            ("Type", Value::str("AWS_PROXY")),
                            ("Uri", invocation_uri(function)),
                        ]),
                    ),
            )?;
        }

        // A deployment snapshots the methods, which it does not reference
        let deployment = api_id.child("Deployment")?;
        stack.add(
            Resource::new(deployment.clone(), ResourceType::ApiDeployment)
                .with_property("RestApiId", Value::reference(&api_id))
                .with_property("Description", "Automatically created by the RestApi construct")
                .with_dependency(&proxy_method)
                .with_dependency(&root_method)
                .with_dependency(&proxy_resource),
        )?;

        let stage = deployment.child(&format!("Stage{}", props.stage_name))?;
        stack.add(
            Resource::new(stage.clone(), ResourceType::ApiStage)
                .with_property("RestApiId", Value::reference(&api_id))
                .with_property("DeploymentId", Value::reference(&deployment))
                .with_property("StageName", props.stage_name.as_str()),
        )?;

        for (method, path) in [(&proxy_method, "/*/*"), (&root_method, "/*/")] {
            stack.add(
                Resource::new(method.child("ApiPermission")?, ResourceType::LambdaPermission)
                    .with_property("Action", "lambda:InvokeFunction")
                    .with_property("FunctionName", function.arn())
                    .with_property("Principal", "apigateway.amazonaws.com")
                    .with_property(
                        "SourceArn",
                        Value::concat(vec![
                            Value::str("arn:"),
                            PseudoParameter::Partition.into(),
                            Value::str(":execute-api:"),
                            PseudoParameter::Region.into(),
                            Value::str(":"),
                            PseudoParameter::AccountId.into(),
                            Value::str(":"),
                            Value::reference(&api_id),
                            Value::str("/"),
                            Value::reference(&stage),
                            Value::str(path),
                        ]),
                    ),
            )?;
        }

        Ok(Self {
            id: api_id,
            proxy_resource,
            methods: vec![proxy_method, root_method],
            deployment,
            stage,
            stage_name: props.stage_name,
        })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn proxy_resource(&self) -> &LogicalId {
        &self.proxy_resource
    }

    pub fn methods(&self) -> &[LogicalId] {
        &self.methods
    }

    pub fn deployment(&self) -> &LogicalId {
        &self.deployment
    }

    pub fn stage(&self) -> &LogicalId {
        &self.stage
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Invoke URL of the deployed stage
    pub fn url(&self) -> Value {
        Value::concat(vec![
            Value::str("https://"),
            Value::reference(&self.id),
            Value::str(".execute-api."),
            PseudoParameter::Region.into(),
            Value::str("."),
            PseudoParameter::UrlSuffix.into(),
            Value::str("/"),
            Value::reference(&self.stage),
            Value::str("/"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::lambda::{Code, FunctionProps, Runtime};
    use crate::graph::DependencyGraph;
    use std::collections::BTreeMap;

    fn declare() -> (Stack, Function, LambdaRestApi) {
        let mut stack = Stack::new("test");
        let function = Function::new(
            &mut stack,
            "Lambda",
            FunctionProps {
                runtime: Runtime::Nodejs10x,
                code: Code::Inline("exports.handler = async () => ({})".to_string()),
                handler: "index.handler".to_string(),
                vpc: None,
                environment: BTreeMap::new(),
            },
        )
        .unwrap();
        let api = LambdaRestApi::new(
            &mut stack,
            "api",
            &function,
            LambdaRestApiProps {
                name: "api".to_string(),
                stage_name: "prod".to_string(),
            },
        )
        .unwrap();
        (stack, function, api)
    }

    #[test]
    fn test_every_method_proxies_to_the_function() {
        let (stack, function, api) = declare();
        assert_eq!(api.methods().len(), 2);
        for method in api.methods() {
            let resource = stack.resource(method).unwrap();
            assert_eq!(
                resource.property("HttpMethod").and_then(Value::as_literal_str),
                Some("ANY")
            );
            let integration = resource.property("Integration").unwrap();
            assert_eq!(
                integration.field("Type").and_then(Value::as_literal_str),
                Some("AWS_PROXY")
            );
            assert!(integration
                .field("Uri")
                .unwrap()
                .references()
                .contains(function.id()));
        }
        assert_eq!(stack.resources_of_type(ResourceType::LambdaPermission).count(), 2);
    }

    #[test]
    fn test_deployment_follows_methods() {
        let (stack, _, api) = declare();
        let graph = DependencyGraph::build(&stack).unwrap();
        let order = graph.topological_order();
        let position = |id: &LogicalId| order.iter().position(|i| i == id).unwrap();

        for method in api.methods() {
            assert!(position(method) < position(api.deployment()));
        }
        assert!(position(api.deployment()) < position(api.stage()));
        assert_eq!(api.stage().as_str(), "apiDeploymentStageprod");
    }
}
