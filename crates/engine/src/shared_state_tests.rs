// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use trawl_core::{CachedEntity, FakeClock, OpKind, OperationConfig, SiteRecord};

fn operation(kind: OpKind) -> Operation {
    OperationConfig::new(kind).build(&FakeClock::new())
}

#[test]
fn begin_claims_the_slot_once() {
    let shared = SharedState::new();
    assert!(shared.try_begin(&operation(OpKind::Enumeration)));
    assert!(!shared.try_begin(&operation(OpKind::Enrichment)));
}

#[test]
fn begin_records_the_scope_hint() {
    let shared = SharedState::new();
    let op = OperationConfig::new(OpKind::PermissionCollection)
        .scope("https://contoso.example.com/sites/hr".parse::<url::Url>().unwrap())
        .build(&FakeClock::new());
    shared.try_begin(&op);
    assert_eq!(
        shared.site_url().as_deref(),
        Some("https://contoso.example.com/sites/hr")
    );
}

#[test]
fn log_preserves_append_order() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    for i in 0..50 {
        shared.append_log(format!("line {i}"));
    }
    let log = shared.status().log;
    assert_eq!(log.len(), 50);
    // Entries observed earlier remain, in order, at any later read.
    for (i, line) in log.iter().enumerate() {
        assert_eq!(line, &format!("line {i}"));
    }
    shared.append_log("one more");
    assert_eq!(shared.status().log[..50], log[..]);
}

#[test]
fn finish_flips_both_flags() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    let status = shared.status();
    assert!(status.running && !status.complete);

    shared.finish();
    let status = shared.status();
    assert!(!status.running && status.complete);
}

#[test]
fn acknowledge_requires_completion() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    assert_eq!(shared.acknowledge(), Err(AckError::NotComplete));

    shared.finish();
    shared.acknowledge().unwrap();
    let status = shared.status();
    assert!(!status.running && !status.complete && status.log.is_empty());
}

#[test]
fn acknowledge_keeps_cached_data() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    shared.with_data(|data| {
        data.merge(CachedEntity::Site(SiteRecord {
            url: "https://a".into(),
            title: "A".into(),
            template: None,
            storage_mb: None,
        }))
    });
    shared.finish();
    shared.acknowledge().unwrap();
    assert_eq!(shared.status().summary.sites, 1);
}

#[test]
fn slot_is_reusable_after_acknowledge() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    shared.set_error("boom");
    shared.finish();
    shared.acknowledge().unwrap();

    assert!(shared.try_begin(&operation(OpKind::Enrichment)));
    let status = shared.status();
    assert!(status.error.is_none());
    assert!(status.log.is_empty());
}

#[test]
fn status_serializes_for_polling() {
    let shared = SharedState::new();
    shared.try_begin(&operation(OpKind::Enumeration));
    shared.append_log("working");
    shared.set_error("partial");
    let json = serde_json::to_value(shared.status()).unwrap();
    assert_eq!(json["running"], true);
    assert_eq!(json["complete"], false);
    assert_eq!(json["error"], "partial");
    assert_eq!(json["log"][0], "working");
    assert_eq!(json["summary"]["sites"], 0);
}
