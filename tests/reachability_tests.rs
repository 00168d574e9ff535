// Copyright (c) 2025 - Cowboy AI, Inc.
//! Front Door Reachability Tests
//!
//! The function sits only in isolated subnets, so the proxy integration in
//! front of it has no network path. These tests pin that behavior down: the
//! path is reported, and a variant with a public tier is not.

mod fixtures;

use fixtures::default_app;
use neptune_stack::domain::SubnetType;
use neptune_stack::reachability::{subnet_egress, Egress};
use neptune_stack::{analyze, build_stack, Finding, StackConfig};

#[test]
fn test_front_door_is_reported_unreachable() {
    let app = default_app();
    let findings = analyze(&app.stack);

    assert_eq!(findings.len(), app.api.methods().len());
    for finding in &findings {
        let Finding::FrontDoorUnreachable {
            method,
            function,
            subnets,
        } = finding;
        assert!(app.api.methods().contains(method));
        assert_eq!(function, app.function.id());
        assert_eq!(subnets, &app.tier_subnets());
    }
}

#[test]
fn test_isolated_tier_has_no_route_out() {
    let app = default_app();
    for subnet in app.tier_subnets() {
        assert_eq!(subnet_egress(&app.stack, &subnet), Egress::Isolated);
    }
    assert!(app.vpc.internet_gateway().is_none());
}

#[test]
fn test_public_tier_variant_is_not_flagged() {
    let config = StackConfig {
        subnet_type: SubnetType::Public,
        ..StackConfig::default()
    };
    let app = build_stack(&config).unwrap();

    assert!(analyze(&app.stack).is_empty());
    for subnet in app.tier_subnets() {
        assert_eq!(subnet_egress(&app.stack, &subnet), Egress::Internet);
    }
    // The database placement invariant no longer holds for this variant
    assert!(app.validate().is_err());
}

#[test]
fn test_finding_serializes_with_kind() {
    let app = default_app();
    let finding = analyze(&app.stack).remove(0);
    let json = serde_json::to_value(&finding).unwrap();
    assert_eq!(json["kind"], "front_door_unreachable");
    assert_eq!(json["function"], "Lambda");
}
