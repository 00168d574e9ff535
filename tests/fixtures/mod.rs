// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for neptune-stack
//!
//! Provides a recording [`Provisioner`] that stands in for the orchestration
//! engine. It answers every request with deterministic physical ids and
//! generated attributes, remembers the order requests arrived in, and can
//! be told to reject or stall a specific resource.
//!
//! # Design Principles
//! - Generated values are derived from the request, never random
//! - Nothing is created anywhere; the provisioner only records
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use neptune_stack::apply::{
    ApplyContext, ProvisionError, ProvisionRequest, ProvisionedResource, Provisioner,
};
use neptune_stack::domain::{LogicalId, ResourceType};
use neptune_stack::{build_stack, NeptuneStack, StackConfig};

pub const REGION: &str = "us-east-1";
pub const ACCOUNT_ID: &str = "123456789012";
pub const ASSET_BUCKET: &str = "neptune-assets-bucket";

/// Cluster endpoint the provisioner generates for a cluster identifier
pub fn generated_endpoint(cluster_identifier: &str) -> String {
    format!(
        "{}.cluster-c0ffee123456.{}.neptune.amazonaws.com",
        cluster_identifier.to_lowercase(),
        REGION
    )
}

/// Apply context with the asset bucket parameter supplied
pub fn context() -> ApplyContext {
    ApplyContext::new(REGION, ACCOUNT_ID).with_parameter("AssetBucket", ASSET_BUCKET)
}

/// The application declared with default configuration
pub fn default_app() -> NeptuneStack {
    build_stack(&StackConfig::default()).expect("default configuration declares a valid stack")
}

pub fn id(s: &str) -> LogicalId {
    LogicalId::new(s).expect("valid logical id in fixture")
}

/// Records requests and answers with generated ids and attributes
#[derive(Default)]
pub struct RecordingProvisioner {
    requests: Mutex<Vec<ProvisionRequest>>,
    reject: BTreeSet<LogicalId>,
    stall: Option<(LogicalId, Duration)>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the request for `id`
    pub fn rejecting(mut self, id: &str) -> Self {
        self.reject.insert(self::id(id));
        self
    }

    /// Take `delay` before answering the request for `id`
    pub fn stalling(mut self, id: &str, delay: Duration) -> Self {
        self.stall = Some((self::id(id), delay));
        self
    }

    /// Requests in the order they were received
    pub fn requests(&self) -> Vec<ProvisionRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    /// Logical ids in the order they were received
    pub fn order(&self) -> Vec<LogicalId> {
        self.requests()
            .into_iter()
            .map(|request| request.logical_id)
            .collect()
    }

    pub fn request(&self, id: &LogicalId) -> Option<ProvisionRequest> {
        self.requests()
            .into_iter()
            .find(|request| &request.logical_id == id)
    }

    fn answer(request: &ProvisionRequest) -> ProvisionedResource {
        let logical = request.logical_id.as_str();
        let lower = logical.to_lowercase();
        match request.resource_type {
            ResourceType::Vpc => ProvisionedResource::new(format!("vpc-{}", lower))
                .with_attribute(
                    "CidrBlock",
                    request.properties.get("CidrBlock").cloned().unwrap_or_default(),
                ),
            ResourceType::Eip => ProvisionedResource::new(format!("eip-{}", lower))
                .with_attribute("AllocationId", format!("eipalloc-{}", lower)),
            ResourceType::Subnet => ProvisionedResource::new(format!("subnet-{}", lower)),
            ResourceType::RouteTable => ProvisionedResource::new(format!("rtb-{}", lower)),
            ResourceType::SecurityGroup => ProvisionedResource::new(format!("sg-{}", lower))
                .with_attribute("GroupId", format!("sg-{}", lower)),
            ResourceType::IamRole => ProvisionedResource::new(lower.clone()).with_attribute(
                "Arn",
                format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, logical),
            ),
            ResourceType::NeptuneDbSubnetGroup => ProvisionedResource::new(
                request
                    .property_str("DBSubnetGroupName")
                    .unwrap_or(logical)
                    .to_string(),
            ),
            ResourceType::NeptuneDbCluster => {
                let identifier = request.property_str("DBClusterIdentifier").unwrap_or(logical);
                ProvisionedResource::new(identifier.to_lowercase())
                    .with_attribute("Endpoint", generated_endpoint(identifier))
                    .with_attribute(
                        "ReadEndpoint",
                        generated_endpoint(identifier).replace(".cluster-", ".cluster-ro-"),
                    )
                    .with_attribute("Port", json!("8182"))
            }
            ResourceType::LambdaFunction => ProvisionedResource::new(logical).with_attribute(
                "Arn",
                format!(
                    "arn:aws:lambda:{}:{}:function:{}",
                    REGION, ACCOUNT_ID, logical
                ),
            ),
            ResourceType::RestApi => ProvisionedResource::new(format!("api{}", lower))
                .with_attribute("RootResourceId", format!("root{}", lower)),
            _ => ProvisionedResource::new(format!("{}-physical", lower)),
        }
    }
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    fn name(&self) -> &str {
        "recording"
    }

    async fn create(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedResource, ProvisionError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());

        if let Some((id, delay)) = &self.stall {
            if id == &request.logical_id {
                tokio::time::sleep(*delay).await;
            }
        }

        if self.reject.contains(&request.logical_id) {
            return Err(ProvisionError::Rejected(format!(
                "{} is not allowed",
                request.logical_id
            )));
        }

        Ok(Self::answer(request))
    }
}
