// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Structural Invariants
//!
//! Checks over a declared [`Stack`] that the orchestration engine would not
//! reject on its own but that the resource graph must satisfy.
//!
//! # Invariant Categories
//!
//! 1. **Access control**: ingress rules admit exactly what was declared
//! 2. **Placement**: subnet groups only use the network's isolated subnets
//! 3. **Isolation**: isolated subnets have no route to a public network
//! 4. **Outputs**: emitted values are provider attributes, not literals
//!
//! All functions are pure (no I/O, no mutation) and return a
//! [`ValidationResult`].

use crate::domain::{LogicalId, Port, ResourceType};
use crate::reachability::{subnet_egress, Egress};
use crate::stack::{Resource, Stack, Value};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Referenced resource is not declared
    #[error("Resource {0} is not declared")]
    UnknownResource(LogicalId),

    /// Resource has an unexpected type
    #[error("Resource {id} is a {actual}, expected {expected}")]
    WrongResourceType {
        id: LogicalId,
        expected: ResourceType,
        actual: ResourceType,
    },

    /// Required property is missing or malformed
    #[error("Resource {id} has no usable {property} property")]
    MissingProperty { id: LogicalId, property: String },

    /// No ingress rule admits traffic into the group
    #[error("Security group {0} has no ingress rule")]
    NoIngress(LogicalId),

    /// Ingress rule admits more than the declared port or source
    #[error("Ingress rule {rule} on {group} is broader than declared: {detail}")]
    BroaderIngress {
        group: LogicalId,
        rule: LogicalId,
        detail: String,
    },

    /// Subnet does not belong to the network boundary
    #[error("Subnet {subnet} does not belong to {vpc}")]
    SubnetOutsideNetwork { subnet: LogicalId, vpc: LogicalId },

    /// Subnet routes to a public network
    #[error("Subnet {0} is not isolated")]
    SubnetNotIsolated(LogicalId),

    /// Output is not the expected provider attribute
    #[error("Output {output} must be {resource}.{attribute}")]
    OutputMismatch {
        output: LogicalId,
        resource: LogicalId,
        attribute: String,
    },
}

/// Target of a `Ref` or `Fn::GetAtt`
pub fn reference_target(value: &Value) -> Option<&LogicalId> {
    match value {
        Value::Ref(id) | Value::GetAtt(id, _) => Some(id),
        _ => None,
    }
}

fn literal_u16(value: &Value) -> Option<u16> {
    match value {
        Value::Literal(v) => v.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

fn expect_resource<'a>(
    stack: &'a Stack,
    id: &LogicalId,
    expected: ResourceType,
) -> Result<&'a Resource, ValidationError> {
    let resource = stack
        .resource(id)
        .ok_or_else(|| ValidationError::UnknownResource(id.clone()))?;
    if resource.resource_type() != expected {
        return Err(ValidationError::WrongResourceType {
            id: id.clone(),
            expected,
            actual: resource.resource_type(),
        });
    }
    Ok(resource)
}

/// Validate the group's ingress admits exactly `port` from exactly itself
///
/// # Rules
/// - At least one ingress rule targets the group
/// - Every rule uses the declared protocol and exactly the declared range
/// - Every rule's source is the group itself (no CIDR sources)
/// - The group carries no inline rules
pub fn validate_self_referencing_ingress(
    stack: &Stack,
    group: &LogicalId,
    port: Port,
) -> ValidationResult {
    let declared = expect_resource(stack, group, ResourceType::SecurityGroup)?;
    if let Some(inline) = declared
        .property("SecurityGroupIngress")
        .and_then(Value::as_list)
        .filter(|rules| !rules.is_empty())
    {
        return Err(ValidationError::BroaderIngress {
            group: group.clone(),
            rule: group.clone(),
            detail: format!("{} inline rule(s)", inline.len()),
        });
    }

    let rules: Vec<&Resource> = stack
        .resources_of_type(ResourceType::SecurityGroupIngress)
        .filter(|rule| rule.property("GroupId").and_then(reference_target) == Some(group))
        .collect();

    if rules.is_empty() {
        return Err(ValidationError::NoIngress(group.clone()));
    }

    let (from_port, to_port) = port.range();
    for rule in rules {
        let broader = |detail: String| ValidationError::BroaderIngress {
            group: group.clone(),
            rule: rule.logical_id().clone(),
            detail,
        };

        let protocol = rule.property("IpProtocol").and_then(Value::as_literal_str);
        if protocol != Some(port.protocol().as_str()) {
            return Err(broader(format!("protocol {:?}", protocol)));
        }

        let from = rule.property("FromPort").and_then(literal_u16);
        let to = rule.property("ToPort").and_then(literal_u16);
        if from != Some(from_port) || to != Some(to_port) {
            return Err(broader(format!("port range {:?}-{:?}", from, to)));
        }

        if rule.property("CidrIp").is_some() || rule.property("CidrIpv6").is_some() {
            return Err(broader("CIDR source".to_string()));
        }

        let source = rule
            .property("SourceSecurityGroupId")
            .and_then(reference_target);
        if source != Some(group) {
            return Err(broader(format!("source {:?}", source.map(LogicalId::as_str))));
        }
    }

    Ok(())
}

/// Validate every isolated subnet of the VPC has no public route
pub fn validate_isolated_tier(stack: &Stack, subnets: &[LogicalId]) -> ValidationResult {
    for subnet in subnets {
        expect_resource(stack, subnet, ResourceType::Subnet)?;
        if subnet_egress(stack, subnet) != Egress::Isolated {
            return Err(ValidationError::SubnetNotIsolated(subnet.clone()));
        }
    }
    Ok(())
}

/// Validate a subnet group's members are a subset of the VPC's isolated subnets
///
/// # Rules
/// - `SubnetIds` is a list of subnet references
/// - Every member is a subnet of `vpc`
/// - Every member is isolated
pub fn validate_subnet_group_membership(
    stack: &Stack,
    subnet_group: &LogicalId,
    vpc: &LogicalId,
) -> ValidationResult {
    let group = expect_resource(stack, subnet_group, ResourceType::NeptuneDbSubnetGroup)?;
    expect_resource(stack, vpc, ResourceType::Vpc)?;

    let missing = || ValidationError::MissingProperty {
        id: subnet_group.clone(),
        property: "SubnetIds".to_string(),
    };
    let members = group
        .property("SubnetIds")
        .and_then(Value::as_list)
        .ok_or_else(missing)?;
    if members.is_empty() {
        return Err(missing());
    }

    for member in members {
        let subnet_id = reference_target(member).ok_or_else(missing)?;
        let subnet = expect_resource(stack, subnet_id, ResourceType::Subnet)?;
        if subnet.property("VpcId").and_then(reference_target) != Some(vpc) {
            return Err(ValidationError::SubnetOutsideNetwork {
                subnet: subnet_id.clone(),
                vpc: vpc.clone(),
            });
        }
        if subnet_egress(stack, subnet_id) != Egress::Isolated {
            return Err(ValidationError::SubnetNotIsolated(subnet_id.clone()));
        }
    }

    Ok(())
}

/// Validate an output is exactly `resource.attribute`
pub fn validate_output_is_attribute(
    stack: &Stack,
    output: &LogicalId,
    resource: &LogicalId,
    attribute: &str,
) -> ValidationResult {
    let mismatch = || ValidationError::OutputMismatch {
        output: output.clone(),
        resource: resource.clone(),
        attribute: attribute.to_string(),
    };
    match stack.output(output).map(|o| &o.value) {
        Some(Value::GetAtt(id, attr)) if id == resource && attr == attribute => Ok(()),
        _ => Err(mismatch()),
    }
}
