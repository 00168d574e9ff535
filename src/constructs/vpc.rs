// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Boundary Construct
//!
//! Declares a VPC and its subnet tiers. Each tier gets one subnet per
//! availability zone, each subnet its own route table:
//!
//! ```text
//! Public            subnet ─ route table ─ 0.0.0.0/0 → internet gateway
//! PrivateWithEgress subnet ─ route table ─ 0.0.0.0/0 → NAT gateway (public tier, same AZ)
//! PrivateIsolated   subnet ─ route table ─ (no routes)
//! ```
//!
//! Subnet blocks are carved from the VPC range in declaration order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::domain::{Cidr, LogicalId, NetworkError, ResourceType, SubnetType};
use crate::errors::{StackError, StackResult};
use crate::stack::{Resource, Stack, Value};

/// One subnet tier of the VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetConfiguration {
    pub name: String,
    pub subnet_type: SubnetType,
    pub cidr_mask: u8,
}

/// VPC declaration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcProps {
    pub cidr: Cidr,
    pub max_azs: usize,
    pub subnet_configuration: Vec<SubnetConfiguration>,
}

impl Default for VpcProps {
    fn default() -> Self {
        Self {
            cidr: Cidr::default(),
            max_azs: 2,
            subnet_configuration: vec![
                SubnetConfiguration {
                    name: "Public".to_string(),
                    subnet_type: SubnetType::Public,
                    cidr_mask: 24,
                },
                SubnetConfiguration {
                    name: "Private".to_string(),
                    subnet_type: SubnetType::PrivateWithEgress,
                    cidr_mask: 24,
                },
            ],
        }
    }
}

/// A declared subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: LogicalId,
    pub route_table: LogicalId,
    pub tier: String,
    pub subnet_type: SubnetType,
    pub cidr: Cidr,
    pub az_index: usize,
}

/// A declared VPC
#[derive(Debug, Clone)]
pub struct Vpc {
    id: LogicalId,
    cidr: Cidr,
    max_azs: usize,
    subnets: Vec<Subnet>,
    internet_gateway: Option<LogicalId>,
    nat_gateways: BTreeMap<usize, LogicalId>,
}

/// Sequential, aligned allocation of subnet blocks
struct BlockAllocator {
    network: Cidr,
    next: u64,
}

impl BlockAllocator {
    fn new(network: Cidr) -> Self {
        Self { network, next: 0 }
    }

    fn allocate(&mut self, mask: u8) -> Result<Cidr, NetworkError> {
        let capacity = u64::from(self.network.subnet_capacity(mask)?);
        let size = 1u64 << (32 - u32::from(mask));
        let index = self.next.div_ceil(size);
        if index >= capacity {
            return Err(NetworkError::Exhausted(self.network.to_string()));
        }
        self.next = (index + 1) * size;
        // index < capacity <= 2^12, so it fits in u32
        self.network.subnet(mask, index as u32)
    }
}

impl Vpc {
    /// Declare the VPC, its subnets, route tables and gateways
    ///
    /// # Invariants
    /// - At least one availability zone and one subnet tier
    /// - Tier names are unique
    /// - A private-with-egress tier requires a public tier for its NAT gateways
    pub fn new(stack: &mut Stack, id: &str, props: VpcProps) -> StackResult<Self> {
        if props.max_azs == 0 {
            return Err(StackError::Configuration(
                "VPC needs at least one availability zone".to_string(),
            ));
        }
        if props.subnet_configuration.is_empty() {
            return Err(StackError::Configuration(
                "VPC needs at least one subnet tier".to_string(),
            ));
        }
        let mut names = BTreeSet::new();
        for tier in &props.subnet_configuration {
            if !names.insert(tier.name.as_str()) {
                return Err(StackError::Configuration(format!(
                    "Duplicate subnet tier name: {}",
                    tier.name
                )));
            }
        }
        let has_public = props
            .subnet_configuration
            .iter()
            .any(|t| t.subnet_type == SubnetType::Public);
        let needs_nat = props
            .subnet_configuration
            .iter()
            .any(|t| t.subnet_type == SubnetType::PrivateWithEgress);
        if needs_nat && !has_public {
            return Err(StackError::Configuration(
                "A private subnet tier with egress needs a public tier for its NAT gateways"
                    .to_string(),
            ));
        }

        let vpc_id = LogicalId::sanitize(id)?;
        stack.add(
            Resource::new(vpc_id.clone(), ResourceType::Vpc)
                .with_property("CidrBlock", props.cidr.to_string())
                .with_property("EnableDnsHostnames", true)
                .with_property("EnableDnsSupport", true)
                .with_property("InstanceTenancy", "default")
                .with_tag("Name", &format!("{}/{}", stack.name(), id)),
        )?;

        let mut vpc = Self {
            id: vpc_id,
            cidr: props.cidr,
            max_azs: props.max_azs,
            subnets: Vec::new(),
            internet_gateway: None,
            nat_gateways: BTreeMap::new(),
        };

        let mut allocator = BlockAllocator::new(props.cidr);
        for tier in &props.subnet_configuration {
            for az_index in 0..props.max_azs {
                let cidr = allocator.allocate(tier.cidr_mask)?;
                let subnet = vpc.declare_subnet(stack, id, tier, az_index, cidr)?;
                vpc.subnets.push(subnet);
            }
        }

        if has_public {
            vpc.declare_public_routes(stack)?;
        }
        if needs_nat {
            vpc.declare_egress_routes(stack)?;
        }

        info!(
            "Declared VPC {} ({}) with {} subnets across {} AZs",
            vpc.id,
            vpc.cidr,
            vpc.subnets.len(),
            vpc.max_azs
        );
        Ok(vpc)
    }

    fn declare_subnet(
        &self,
        stack: &mut Stack,
        construct: &str,
        tier: &SubnetConfiguration,
        az_index: usize,
        cidr: Cidr,
    ) -> StackResult<Subnet> {
        let path = format!("{}{}Subnet{}", self.id, tier.name, az_index + 1);
        let subnet_id = LogicalId::sanitize(&path)?;
        let route_table = subnet_id.child("RouteTable")?;
        let association = subnet_id.child("RouteTableAssociation")?;
        let name_tag = format!(
            "{}/{}/{}Subnet{}",
            stack.name(),
            construct,
            tier.name,
            az_index + 1
        );

        stack.add(
            Resource::new(subnet_id.clone(), ResourceType::Subnet)
                .with_property("VpcId", Value::reference(&self.id))
                .with_property("CidrBlock", cidr.to_string())
                .with_property("AvailabilityZone", Value::availability_zone(az_index))
                .with_property(
                    "MapPublicIpOnLaunch",
                    tier.subnet_type == SubnetType::Public,
                )
                .with_tag("Name", &name_tag)
                .with_tag("subnet-tier", &tier.name)
                .with_tag("subnet-type", tier.subnet_type.as_str()),
        )?;
        stack.add(
            Resource::new(route_table.clone(), ResourceType::RouteTable)
                .with_property("VpcId", Value::reference(&self.id))
                .with_tag("Name", &name_tag),
        )?;
        stack.add(
            Resource::new(association, ResourceType::SubnetRouteTableAssociation)
                .with_property("RouteTableId", Value::reference(&route_table))
                .with_property("SubnetId", Value::reference(&subnet_id)),
        )?;

        Ok(Subnet {
            id: subnet_id,
            route_table,
            tier: tier.name.clone(),
            subnet_type: tier.subnet_type,
            cidr,
            az_index,
        })
    }

    fn declare_public_routes(&mut self, stack: &mut Stack) -> StackResult<()> {
        let igw = self.id.child("IGW")?;
        let attachment = self.id.child("VPCGW")?;
        stack.add(
            Resource::new(igw.clone(), ResourceType::InternetGateway)
                .with_tag("Name", &format!("{}/{}", stack.name(), self.id)),
        )?;
        stack.add(
            Resource::new(attachment.clone(), ResourceType::VpcGatewayAttachment)
                .with_property("VpcId", Value::reference(&self.id))
                .with_property("InternetGatewayId", Value::reference(&igw)),
        )?;

        for subnet in self.subnets.iter().filter(|s| s.subnet_type == SubnetType::Public) {
            // The route only works once the gateway is attached, which the data does not show
            stack.add(
                Resource::new(subnet.id.child("DefaultRoute")?, ResourceType::Route)
                    .with_property("RouteTableId", Value::reference(&subnet.route_table))
                    .with_property("DestinationCidrBlock", "0.0.0.0/0")
                    .with_property("GatewayId", Value::reference(&igw))
                    .with_dependency(&attachment),
            )?;
        }

        self.internet_gateway = Some(igw);
        Ok(())
    }

    fn declare_egress_routes(&mut self, stack: &mut Stack) -> StackResult<()> {
        let publics: Vec<Subnet> = self
            .subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Public)
            .cloned()
            .collect();

        for subnet in self
            .subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::PrivateWithEgress)
        {
            let nat = match self.nat_gateways.get(&subnet.az_index) {
                Some(nat) => nat.clone(),
                None => {
                    let public = publics
                        .iter()
                        .find(|p| p.az_index == subnet.az_index)
                        .ok_or_else(|| {
                            StackError::Configuration(format!(
                                "No public subnet in AZ {} for a NAT gateway",
                                subnet.az_index
                            ))
                        })?;
                    let eip = public.id.child("EIP")?;
                    let nat = public.id.child("NATGateway")?;
                    stack.add(
                        Resource::new(eip.clone(), ResourceType::Eip).with_property("Domain", "vpc"),
                    )?;
                    stack.add(
                        Resource::new(nat.clone(), ResourceType::NatGateway)
                            .with_property("SubnetId", Value::reference(&public.id))
                            .with_property("AllocationId", Value::get_att(&eip, "AllocationId")),
                    )?;
                    self.nat_gateways.insert(subnet.az_index, nat.clone());
                    nat
                }
            };

            stack.add(
                Resource::new(subnet.id.child("DefaultRoute")?, ResourceType::Route)
                    .with_property("RouteTableId", Value::reference(&subnet.route_table))
                    .with_property("DestinationCidrBlock", "0.0.0.0/0")
                    .with_property("NatGatewayId", Value::reference(&nat)),
            )?;
        }
        Ok(())
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn cidr(&self) -> Cidr {
        self.cidr
    }

    pub fn max_azs(&self) -> usize {
        self.max_azs
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn internet_gateway(&self) -> Option<&LogicalId> {
        self.internet_gateway.as_ref()
    }

    /// Subnets of every tier of the given type
    pub fn select_subnets(&self, subnet_type: SubnetType) -> Vec<&Subnet> {
        self.subnets
            .iter()
            .filter(|s| s.subnet_type == subnet_type)
            .collect()
    }

    /// Logical ids of the subnets of the given type
    pub fn subnet_ids(&self, subnet_type: SubnetType) -> Vec<LogicalId> {
        self.select_subnets(subnet_type)
            .into_iter()
            .map(|s| s.id.clone())
            .collect()
    }

    /// The `index`-th availability zone the VPC spans
    pub fn availability_zone(&self, index: usize) -> StackResult<Value> {
        if index >= self.max_azs {
            return Err(StackError::Configuration(format!(
                "VPC {} spans {} AZs, no AZ at index {}",
                self.id, self.max_azs, index
            )));
        }
        Ok(Value::availability_zone(index))
    }
}
