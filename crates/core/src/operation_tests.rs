// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::FakeClock;

#[test]
fn op_kind_display() {
    assert_eq!(OpKind::Enumeration.to_string(), "enumeration");
    assert_eq!(OpKind::PermissionCollection.to_string(), "permissions");
    assert_eq!(OpKind::Enrichment.to_string(), "enrichment");
}

#[test]
fn operation_defaults_to_tenant_wide() {
    let clock = FakeClock::new();
    let op = OperationConfig::new(OpKind::Enumeration).build(&clock);
    assert!(op.scope.is_none());
    assert!(op.id.as_str().starts_with("op-"));
    assert_eq!(op.created_at_ms, clock.epoch_ms());
}

#[test]
fn operation_scope_is_preserved() {
    let clock = FakeClock::new();
    let scope: Url = "https://contoso.example.com/teams/hr".parse().unwrap();
    let op = OperationConfig::new(OpKind::PermissionCollection)
        .scope(scope.clone())
        .build(&clock);
    assert_eq!(op.scope, Some(scope));
}

#[test]
fn describe_mentions_scope() {
    let clock = FakeClock::new();
    let op = OperationConfig::new(OpKind::Enrichment).build(&clock);
    assert_eq!(op.describe(), "enrichment (tenant-wide)");

    let scoped = OperationConfig::new(OpKind::Enumeration)
        .scope("https://contoso.example.com/".parse::<Url>().unwrap())
        .build(&clock);
    assert!(scoped.describe().contains("site https://contoso.example.com/"));
}

#[test]
fn op_kind_serde_uses_snake_case() {
    let json = serde_json::to_string(&OpKind::PermissionCollection).unwrap();
    assert_eq!(json, "\"permission_collection\"");
}
