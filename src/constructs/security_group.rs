// Copyright (c) 2025 - Cowboy AI, Inc.
//! Access-Control Group Construct

use tracing::debug;

use super::vpc::Vpc;
use crate::domain::{Cidr, LogicalId, Port, ResourceType};
use crate::errors::{StackError, StackResult};
use crate::stack::{Resource, Stack, Value};

/// Source of inbound traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    /// Members of a security group (possibly the group itself)
    SecurityGroup(LogicalId),
    /// An IPv4 block
    Ipv4(Cidr),
    /// Any IPv4 address
    AnyIpv4,
}

/// Security group declaration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupProps {
    pub description: String,
    pub group_name: Option<String>,
    pub allow_all_outbound: bool,
}

impl Default for SecurityGroupProps {
    fn default() -> Self {
        Self {
            description: "Managed security group".to_string(),
            group_name: None,
            allow_all_outbound: true,
        }
    }
}

/// A declared security group
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    id: LogicalId,
    ingress_rules: usize,
}

impl SecurityGroup {
    /// Declare a security group in the VPC
    pub fn new(
        stack: &mut Stack,
        id: &str,
        vpc: &Vpc,
        props: SecurityGroupProps,
    ) -> StackResult<Self> {
        let group_id = LogicalId::sanitize(id)?;

        let egress = if props.allow_all_outbound {
            Value::map([
                ("CidrIp", Value::str("0.0.0.0/0")),
                ("Description", Value::str("Allow all outbound traffic by default")),
                ("IpProtocol", Value::str("-1")),
            ])
        } else {
            // Matches nothing, so no outbound traffic is allowed
            Value::map([
                ("CidrIp", Value::str("255.255.255.255/32")),
                ("Description", Value::str("Disallow all traffic")),
                ("FromPort", Value::from(252u16)),
                ("IpProtocol", Value::str("icmp")),
                ("ToPort", Value::from(86u16)),
            ])
        };

        let mut resource = Resource::new(group_id.clone(), ResourceType::SecurityGroup)
            .with_property("GroupDescription", props.description.as_str())
            .with_property("VpcId", Value::reference(vpc.id()))
            .with_property("SecurityGroupEgress", Value::List(vec![egress]));
        if let Some(name) = &props.group_name {
            resource.set_property("GroupName", name.as_str());
        }
        stack.add(resource)?;

        Ok(Self {
            id: group_id,
            ingress_rules: 0,
        })
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    /// `Fn::GetAtt GroupId` of this group
    pub fn group_id(&self) -> Value {
        Value::get_att(&self.id, "GroupId")
    }

    /// Tag the group
    pub fn add_tag(&self, stack: &mut Stack, key: &str, value: &str) -> StackResult<()> {
        stack
            .resource_mut(&self.id)
            .ok_or_else(|| StackError::UnknownResource(self.id.clone()))?
            .add_tag(key, value);
        Ok(())
    }

    /// Admit `port` from `peer`
    ///
    /// A rule whose source is a security group is declared as a standalone
    /// ingress resource, so a group can admit itself without referring to
    /// its own id inside its own properties. CIDR sources are inlined.
    pub fn add_ingress_rule(
        &mut self,
        stack: &mut Stack,
        peer: Peer,
        port: Port,
        description: &str,
    ) -> StackResult<Option<LogicalId>> {
        let (from_port, to_port) = port.range();
        let mut rule = vec![
            ("IpProtocol", Value::str(port.protocol().as_str())),
            ("Description", Value::str(description)),
        ];
        if port.is_single() || from_port != 0 || to_port != u16::MAX {
            rule.push(("FromPort", Value::from(from_port)));
            rule.push(("ToPort", Value::from(to_port)));
        }

        match peer {
            Peer::SecurityGroup(source) => {
                self.ingress_rules += 1;
                let rule_id = self.id.child(&format!("Ingress{}", self.ingress_rules))?;
                let mut resource = Resource::new(rule_id.clone(), ResourceType::SecurityGroupIngress)
                    .with_property("GroupId", self.group_id())
                    .with_property(
                        "SourceSecurityGroupId",
                        Value::get_att(&source, "GroupId"),
                    );
                for (key, value) in rule {
                    resource.set_property(key, value);
                }
                stack.add(resource)?;
                debug!("Ingress {} on {} from group {}", port, self.id, source);
                Ok(Some(rule_id))
            }
            Peer::Ipv4(_) | Peer::AnyIpv4 => {
                let cidr = match peer {
                    Peer::Ipv4(cidr) => cidr.to_string(),
                    _ => "0.0.0.0/0".to_string(),
                };
                rule.push(("CidrIp", Value::str(cidr)));
                let group = stack
                    .resource_mut(&self.id)
                    .ok_or_else(|| StackError::UnknownResource(self.id.clone()))?;
                let mut inline = match group.property("SecurityGroupIngress") {
                    Some(Value::List(items)) => items.clone(),
                    _ => Vec::new(),
                };
                inline.push(Value::map(rule));
                group.set_property("SecurityGroupIngress", Value::List(inline));
                debug!("Inline ingress {} on {}", port, self.id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::vpc::VpcProps;
    use crate::domain::invariants::validate_self_referencing_ingress;

    fn setup() -> (Stack, SecurityGroup) {
        let mut stack = Stack::new("test");
        let vpc = Vpc::new(&mut stack, "Vpc", VpcProps::default()).unwrap();
        let sg = SecurityGroup::new(
            &mut stack,
            "mySecurityGroup1",
            &vpc,
            SecurityGroupProps {
                description: "security group 1".to_string(),
                group_name: Some("mySecurityGroup".to_string()),
                allow_all_outbound: true,
            },
        )
        .unwrap();
        (stack, sg)
    }

    #[test]
    fn test_self_rule_is_standalone_resource() {
        let (mut stack, mut sg) = setup();
        let self_peer = Peer::SecurityGroup(sg.id().clone());
        let rule = sg
            .add_ingress_rule(&mut stack, self_peer, Port::tcp(8182), "MyRule")
            .unwrap()
            .unwrap();

        let resource = stack.resource(&rule).unwrap();
        assert_eq!(resource.resource_type(), ResourceType::SecurityGroupIngress);
        assert_eq!(
            resource.property("Description").and_then(Value::as_literal_str),
            Some("MyRule")
        );
        assert!(validate_self_referencing_ingress(&stack, sg.id(), Port::tcp(8182)).is_ok());
        assert!(validate_self_referencing_ingress(&stack, sg.id(), Port::tcp(8183)).is_err());
    }

    #[test]
    fn test_cidr_rule_is_inlined() {
        let (mut stack, mut sg) = setup();
        let rule = sg
            .add_ingress_rule(&mut stack, Peer::AnyIpv4, Port::tcp(443), "https")
            .unwrap();
        assert!(rule.is_none());

        let group = stack.resource(sg.id()).unwrap();
        let inline = group
            .property("SecurityGroupIngress")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(inline.len(), 1);
        assert_eq!(
            inline[0].field("CidrIp").and_then(Value::as_literal_str),
            Some("0.0.0.0/0")
        );
    }

    #[test]
    fn test_tags_and_egress() {
        let (mut stack, sg) = setup();
        sg.add_tag(&mut stack, "Name", "mySecurityGroup").unwrap();

        let group = stack.resource(sg.id()).unwrap();
        assert_eq!(group.tag("Name"), Some("mySecurityGroup"));
        let egress = group
            .property("SecurityGroupEgress")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(
            egress[0].field("IpProtocol").and_then(Value::as_literal_str),
            Some("-1")
        );
    }
}
