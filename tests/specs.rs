// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end specs across the workspace: a control surface driving the
//! engine the way the front end would — start, poll, acknowledge.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use trawl_core::{CredentialMaterial, FakeClock, OpKind, OperationConfig, Operation};
use trawl_engine::{EngineConfig, JobOrchestrator, SharedState, StartError};
use trawl_remote::{FakeFlows, FakeRemote, ThrottleConfig};
use trawl_store::{Checkpoint, CheckpointKey, CheckpointStore};

const TENANT_ROOT: &str = "https://contoso-admin.example.com/";

fn creds() -> CredentialMaterial {
    CredentialMaterial::new(TENANT_ROOT.parse().unwrap())
        .access_token("captured-token")
        .client_id("client-abc")
}

fn operation(kind: OpKind) -> Operation {
    OperationConfig::new(kind).build(&FakeClock::new())
}

fn engine(remote: &FakeRemote, dir: &TempDir) -> JobOrchestrator {
    let flows = FakeFlows::new().token_reconnect_ok();
    let config = EngineConfig::new(dir.path()).headless(true).throttle(
        ThrottleConfig::default()
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(2)),
    );
    JobOrchestrator::new(config, Arc::new(remote.clone()), Arc::new(flows)).unwrap()
}

async fn poll_until_complete(shared: &SharedState) {
    for _ in 0..500 {
        let status = shared.status();
        if status.complete {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("operation did not complete in time");
}

fn seeded_tenant() -> FakeRemote {
    let remote = FakeRemote::new();
    for i in 1..=20 {
        let url = format!("https://contoso.example.com/sites/s{i:02}");
        remote.add_site(&url, &format!("Site {i}"));
        remote.add_assignment(&url, "alice@contoso.example.com", "Read");
    }
    remote.add_assignment(
        "https://contoso.example.com/sites/s01",
        "bob@contoso.example.com",
        "Full Control",
    );
    remote.add_identity("alice@contoso.example.com", "Alice A");
    remote.add_identity("bob@contoso.example.com", "Bob B");
    remote
}

#[tokio::test]
async fn full_collection_pipeline() {
    let dir = TempDir::new().unwrap();
    let remote = seeded_tenant();
    let engine = engine(&remote, &dir);

    // Crawl the tenant.
    engine.start(operation(OpKind::Enumeration), creds()).unwrap();
    poll_until_complete(&engine.shared()).await;
    assert_eq!(engine.status().summary.sites, 20);
    engine.acknowledge().unwrap();

    // Collect permissions over the cached sites.
    engine
        .start(operation(OpKind::PermissionCollection), creds())
        .unwrap();
    poll_until_complete(&engine.shared()).await;
    assert_eq!(engine.status().summary.permissions, 21);
    engine.acknowledge().unwrap();

    // Enrich the principals the permissions surfaced.
    engine.start(operation(OpKind::Enrichment), creds()).unwrap();
    poll_until_complete(&engine.shared()).await;

    let status = engine.status();
    assert!(status.error.is_none());
    assert_eq!(status.summary.identities, 2);
    // The cache accumulated across all three runs.
    assert_eq!(status.summary.sites, 20);
    assert_eq!(status.summary.permissions, 21);
}

#[tokio::test]
async fn interrupted_crawl_resumes_from_the_checkpoint() {
    let dir = TempDir::new().unwrap();
    let remote = seeded_tenant();

    // A previous process died after persisting 7 completed units.
    let store = CheckpointStore::new(dir.path()).unwrap();
    let key = CheckpointKey::new(OpKind::Enumeration);
    let mut checkpoint = Checkpoint::default();
    for i in 1..=7 {
        checkpoint.record_unit(format!("https://contoso.example.com/sites/s{i:02}"));
    }
    store.save(&key, &checkpoint).unwrap();

    let engine = engine(&remote, &dir);
    engine.start(operation(OpKind::Enumeration), creds()).unwrap();
    poll_until_complete(&engine.shared()).await;

    // The restart processed units 8..20 only.
    assert_eq!(remote.call_count("site_detail"), 13);
    assert!(engine
        .status()
        .log
        .iter()
        .any(|l| l.contains("resuming enumeration: 7 sites already completed")));
    // Full completion clears the checkpoint.
    assert!(store.load(&key).unwrap().is_none());
}

#[tokio::test]
async fn status_payload_serializes_for_the_front_end() {
    let dir = TempDir::new().unwrap();
    let remote = seeded_tenant();
    let engine = engine(&remote, &dir);

    engine.start(operation(OpKind::Enumeration), creds()).unwrap();
    poll_until_complete(&engine.shared()).await;

    let json = serde_json::to_value(engine.status()).unwrap();
    assert_eq!(json["running"], false);
    assert_eq!(json["complete"], true);
    assert_eq!(json["error"], serde_json::Value::Null);
    assert_eq!(json["summary"]["sites"], 20);
    assert!(json["log"].as_array().unwrap().len() >= 20);
}

#[tokio::test]
async fn control_surface_sees_error_text_verbatim() {
    let dir = TempDir::new().unwrap();
    let remote = FakeRemote::new();
    remote.fail_unit(
        "list_sites",
        "",
        trawl_remote::RemoteError::Permanent("403 Forbidden for api/sites".into()),
    );
    let engine = engine(&remote, &dir);

    engine.start(operation(OpKind::Enumeration), creds()).unwrap();
    poll_until_complete(&engine.shared()).await;

    let status = engine.status();
    assert!(status.complete);
    assert_eq!(
        status.error.as_deref(),
        Some("permanent error: 403 Forbidden for api/sites")
    );
}

#[tokio::test]
async fn only_one_operation_at_a_time() {
    let dir = TempDir::new().unwrap();
    let remote = seeded_tenant();
    let engine = engine(&remote, &dir);

    engine.start(operation(OpKind::Enumeration), creds()).unwrap();
    // The slot is claimed synchronously on accept, so the second start
    // is rejected before the worker has done any work.
    let err = engine.start(operation(OpKind::Enrichment), creds()).unwrap_err();
    assert_eq!(err, StartError::AlreadyRunning);
    poll_until_complete(&engine.shared()).await;
}
