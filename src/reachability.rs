// Copyright (c) 2025 - Cowboy AI, Inc.
//! Front Door Reachability Analysis
//!
//! Derives, from the declared routes alone, whether the HTTP front door can
//! reach the function it proxies to. The function and database sit in an
//! isolated subnet tier, so the declared front door path is reported as
//! unreachable. The finding documents a known limitation; nothing here
//! attempts to correct the declaration.
//!
//! ```text
//! Method ──Integration.Uri──> Function ──VpcConfig.SubnetIds──> Subnet
//!                                                                 │
//! Route <──RouteTableId── RouteTable <──Association───────────────┘
//!   │
//!   └── GatewayId → InternetGateway   => Internet
//!       NatGatewayId → NatGateway     => Nat
//!       (no route)                    => Isolated
//! ```

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::domain::invariants::reference_target;
use crate::domain::{LogicalId, ResourceType};
use crate::stack::{Stack, Value};

/// Outbound path of a subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Egress {
    /// No route to or from a public network
    Isolated,
    /// Outbound only, through a NAT gateway
    Nat,
    /// Routes to an internet gateway
    Internet,
}

/// Result of analysing one front door path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// The method proxies to a function placed only in isolated subnets
    FrontDoorUnreachable {
        method: LogicalId,
        function: LogicalId,
        subnets: Vec<LogicalId>,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::FrontDoorUnreachable {
                method,
                function,
                subnets,
            } => write!(
                f,
                "front door method {} proxies to function {}, which is placed only in isolated subnets ({}) with no route to a public network",
                method,
                function,
                subnets
                    .iter()
                    .map(LogicalId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Widest outbound path declared for a subnet
pub fn subnet_egress(stack: &Stack, subnet: &LogicalId) -> Egress {
    let route_tables: Vec<&LogicalId> = stack
        .resources_of_type(ResourceType::SubnetRouteTableAssociation)
        .filter(|assoc| assoc.property("SubnetId").and_then(reference_target) == Some(subnet))
        .filter_map(|assoc| assoc.property("RouteTableId").and_then(reference_target))
        .collect();

    stack
        .resources_of_type(ResourceType::Route)
        .filter(|route| {
            route
                .property("RouteTableId")
                .and_then(reference_target)
                .is_some_and(|table| route_tables.contains(&table))
        })
        .map(|route| route_egress(stack, route.property("GatewayId"), route.property("NatGatewayId")))
        .max()
        .unwrap_or(Egress::Isolated)
}

fn route_egress(stack: &Stack, gateway: Option<&Value>, nat: Option<&Value>) -> Egress {
    let target_type = |value: Option<&Value>| {
        value
            .and_then(reference_target)
            .and_then(|id| stack.resource(id))
            .map(|r| r.resource_type())
    };
    if target_type(gateway) == Some(ResourceType::InternetGateway) {
        Egress::Internet
    } else if target_type(nat) == Some(ResourceType::NatGateway) {
        Egress::Nat
    } else {
        Egress::Isolated
    }
}

/// Subnets a function is placed in, if it is placed in a VPC
pub fn function_subnets(stack: &Stack, function: &LogicalId) -> Option<Vec<LogicalId>> {
    let subnets = stack
        .resource(function)?
        .property("VpcConfig")?
        .field("SubnetIds")?
        .as_list()?;
    Some(
        subnets
            .iter()
            .filter_map(reference_target)
            .cloned()
            .collect(),
    )
}

/// Analyse every proxy integration of the front door
pub fn analyze(stack: &Stack) -> Vec<Finding> {
    let mut findings = Vec::new();

    for method in stack.resources_of_type(ResourceType::ApiMethod) {
        let Some(integration) = method.property("Integration") else {
            continue;
        };
        if integration
            .field("Type")
            .and_then(Value::as_literal_str)
            != Some("AWS_PROXY")
        {
            continue;
        }
        let Some(uri) = integration.field("Uri") else {
            continue;
        };

        let functions = uri.references().into_iter().filter(|id| {
            stack
                .resource(id)
                .is_some_and(|r| r.resource_type() == ResourceType::LambdaFunction)
        });

        for function in functions {
            let Some(subnets) = function_subnets(stack, &function) else {
                debug!("Function {} is not placed in a VPC", function);
                continue;
            };
            let isolated = !subnets.is_empty()
                && subnets
                    .iter()
                    .all(|subnet| subnet_egress(stack, subnet) == Egress::Isolated);
            if isolated {
                let finding = Finding::FrontDoorUnreachable {
                    method: method.logical_id().clone(),
                    function,
                    subnets,
                };
                warn!("{}", finding);
                findings.push(finding);
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::{
        Code, Function, FunctionProps, LambdaRestApi, LambdaRestApiProps, Runtime,
        SubnetConfiguration, Vpc, VpcPlacement, VpcProps,
    };
    use crate::domain::{Cidr, SubnetType};
    use std::collections::BTreeMap;

    fn front_door(subnet_type: Option<SubnetType>) -> Stack {
        let mut stack = Stack::new("test");
        let vpc = match subnet_type {
            Some(subnet_type) => {
                let vpc = Vpc::new(
                    &mut stack,
                    "Vpc",
                    VpcProps {
                        cidr: Cidr::default(),
                        max_azs: 2,
                        subnet_configuration: vec![SubnetConfiguration {
                            name: "Ingress".to_string(),
                            subnet_type,
                            cidr_mask: 24,
                        }],
                    },
                )
                .unwrap();
                Some(VpcPlacement {
                    subnet_ids: vpc.subnet_ids(subnet_type),
                    security_group_ids: vec![],
                })
            }
            None => None,
        };
        let function = Function::new(
            &mut stack,
            "Lambda",
            FunctionProps {
                runtime: Runtime::Nodejs10x,
                code: Code::Inline(String::new()),
                handler: "index.handler".to_string(),
                vpc,
                environment: BTreeMap::new(),
            },
        )
        .unwrap();
        LambdaRestApi::new(
            &mut stack,
            "api",
            &function,
            LambdaRestApiProps {
                name: "api".to_string(),
                stage_name: "prod".to_string(),
            },
        )
        .unwrap();
        stack
    }

    #[test]
    fn test_isolated_function_is_unreachable() {
        let findings = analyze(&front_door(Some(SubnetType::PrivateIsolated)));
        assert_eq!(findings.len(), 2);
        for finding in &findings {
            let Finding::FrontDoorUnreachable { function, subnets, .. } = finding;
            assert_eq!(function.as_str(), "Lambda");
            assert_eq!(subnets.len(), 2);
        }
    }

    #[test]
    fn test_public_function_is_reachable() {
        assert!(analyze(&front_door(Some(SubnetType::Public))).is_empty());
    }

    #[test]
    fn test_function_outside_vpc_is_not_analysed() {
        assert!(analyze(&front_door(None)).is_empty());
    }

    #[test]
    fn test_subnet_egress_follows_routes() {
        let stack = front_door(Some(SubnetType::Public));
        let subnet = stack
            .resources_of_type(ResourceType::Subnet)
            .next()
            .unwrap()
            .logical_id()
            .clone();
        assert_eq!(subnet_egress(&stack, &subnet), Egress::Internet);
    }
}
