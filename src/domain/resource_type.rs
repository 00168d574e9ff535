// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Resource Type Domain Model
//!
//! Defines the taxonomy of provider resource types that the stack can
//! declare. Every variant maps 1:1 to a managed-service resource type of the
//! template format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider resource type taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum ResourceType {
    // Network boundary
    /// Virtual private cloud
    Vpc,
    /// Subnet inside a VPC
    Subnet,
    /// Route table
    RouteTable,
    /// Route inside a route table
    Route,
    /// Subnet to route table association
    SubnetRouteTableAssociation,
    /// Internet gateway
    InternetGateway,
    /// Internet gateway to VPC attachment
    VpcGatewayAttachment,
    /// NAT gateway
    NatGateway,
    /// Elastic IP address
    Eip,

    // Access control
    /// Security group
    SecurityGroup,
    /// Standalone ingress rule
    SecurityGroupIngress,
    /// IAM role
    IamRole,

    // Graph database
    /// Neptune subnet group
    NeptuneDbSubnetGroup,
    /// Neptune cluster
    NeptuneDbCluster,
    /// Neptune instance
    NeptuneDbInstance,

    // Compute
    /// Lambda function
    LambdaFunction,
    /// Lambda invoke permission
    LambdaPermission,

    // HTTP front door
    /// REST API
    RestApi,
    /// REST API path resource
    ApiResource,
    /// REST API method
    ApiMethod,
    /// REST API deployment
    ApiDeployment,
    /// REST API stage
    ApiStage,
}

impl ResourceType {
    /// All known resource types
    pub const ALL: [ResourceType; 22] = [
        Self::Vpc,
        Self::Subnet,
        Self::RouteTable,
        Self::Route,
        Self::SubnetRouteTableAssociation,
        Self::InternetGateway,
        Self::VpcGatewayAttachment,
        Self::NatGateway,
        Self::Eip,
        Self::SecurityGroup,
        Self::SecurityGroupIngress,
        Self::IamRole,
        Self::NeptuneDbSubnetGroup,
        Self::NeptuneDbCluster,
        Self::NeptuneDbInstance,
        Self::LambdaFunction,
        Self::LambdaPermission,
        Self::RestApi,
        Self::ApiResource,
        Self::ApiMethod,
        Self::ApiDeployment,
        Self::ApiStage,
    ];

    /// Get the template type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::Route => "AWS::EC2::Route",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::Eip => "AWS::EC2::EIP",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
            Self::IamRole => "AWS::IAM::Role",
            Self::NeptuneDbSubnetGroup => "AWS::Neptune::DBSubnetGroup",
            Self::NeptuneDbCluster => "AWS::Neptune::DBCluster",
            Self::NeptuneDbInstance => "AWS::Neptune::DBInstance",
            Self::LambdaFunction => "AWS::Lambda::Function",
            Self::LambdaPermission => "AWS::Lambda::Permission",
            Self::RestApi => "AWS::ApiGateway::RestApi",
            Self::ApiResource => "AWS::ApiGateway::Resource",
            Self::ApiMethod => "AWS::ApiGateway::Method",
            Self::ApiDeployment => "AWS::ApiGateway::Deployment",
            Self::ApiStage => "AWS::ApiGateway::Stage",
        }
    }

    /// Get the category for this resource type
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::RouteTable
            | Self::Route
            | Self::SubnetRouteTableAssociation
            | Self::InternetGateway
            | Self::VpcGatewayAttachment
            | Self::NatGateway
            | Self::Eip => ResourceCategory::Network,

            Self::SecurityGroup | Self::SecurityGroupIngress | Self::IamRole => {
                ResourceCategory::AccessControl
            }

            Self::NeptuneDbSubnetGroup | Self::NeptuneDbCluster | Self::NeptuneDbInstance => {
                ResourceCategory::Database
            }

            Self::LambdaFunction | Self::LambdaPermission => ResourceCategory::Compute,

            Self::RestApi
            | Self::ApiResource
            | Self::ApiMethod
            | Self::ApiDeployment
            | Self::ApiStage => ResourceCategory::FrontDoor,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown resource type: {}", s))
    }
}

impl TryFrom<String> for ResourceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceType> for &'static str {
    fn from(value: ResourceType) -> Self {
        value.as_str()
    }
}

/// Resource category for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Network,
    AccessControl,
    Database,
    Compute,
    FrontDoor,
}
