// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::ctx_for;
use tempfile::tempdir;
use trawl_core::{CachedEntity, OpKind, PermissionRecord};
use trawl_remote::FakeRemote;
use trawl_store::{Checkpoint, CheckpointKey, CheckpointStore};

fn seed_permission(shared: &crate::SharedState, object: &str, principal: &str) {
    shared.with_data(|data| {
        data.merge(CachedEntity::Permission(PermissionRecord {
            object_url: object.into(),
            principal: principal.into(),
            role: "Read".into(),
        }))
    });
}

#[tokio::test]
async fn enriches_distinct_principals_once() {
    let dir = tempdir().unwrap();
    let remote = FakeRemote::new();
    remote.add_identity("alice", "Alice A");
    remote.add_identity("bob", "Bob B");
    let (ctx, shared) = ctx_for(&remote, OpKind::Enrichment, None, &dir);
    // Alice appears on two sites; she is still one principal.
    seed_permission(&shared, "https://a", "alice");
    seed_permission(&shared, "https://b", "alice");
    seed_permission(&shared, "https://a", "bob");

    let summary = EnrichIdentities.run(&ctx).await.unwrap();
    assert_eq!(summary, "enriched 2 identities");
    assert_eq!(remote.call_count("identity"), 2);
    assert_eq!(shared.status().summary.identities, 2);
    let alice = shared
        .with_data(|data| data.get_identity("alice").cloned())
        .unwrap();
    assert_eq!(alice.display_name.as_deref(), Some("Alice A"));
}

#[tokio::test]
async fn nothing_to_enrich_is_a_clean_run() {
    let dir = tempdir().unwrap();
    let remote = FakeRemote::new();
    let (ctx, shared) = ctx_for(&remote, OpKind::Enrichment, None, &dir);

    let summary = EnrichIdentities.run(&ctx).await.unwrap();
    assert_eq!(summary, "enriched 0 identities");
    assert!(shared
        .status()
        .log
        .iter()
        .any(|l| l.contains("nothing to enrich")));
}

#[tokio::test]
async fn unknown_principal_is_skipped() {
    let dir = tempdir().unwrap();
    let remote = FakeRemote::new();
    remote.add_identity("alice", "Alice A");
    let (ctx, shared) = ctx_for(&remote, OpKind::Enrichment, None, &dir);
    seed_permission(&shared, "https://a", "alice");
    seed_permission(&shared, "https://a", "ghost");

    let summary = EnrichIdentities.run(&ctx).await.unwrap();
    assert_eq!(summary, "enriched 1 identities");
    assert!(shared
        .status()
        .log
        .iter()
        .any(|l| l.contains("skipping identity ghost")));
}

#[tokio::test]
async fn resumes_past_completed_principals() {
    let dir = tempdir().unwrap();
    let remote = FakeRemote::new();
    remote.add_identity("alice", "Alice A");
    remote.add_identity("bob", "Bob B");

    let store = CheckpointStore::new(dir.path()).unwrap();
    let key = CheckpointKey::new(OpKind::Enrichment);
    let mut checkpoint = Checkpoint::default();
    checkpoint.record_unit("alice");
    store.save(&key, &checkpoint).unwrap();

    let (ctx, shared) = ctx_for(&remote, OpKind::Enrichment, None, &dir);
    seed_permission(&shared, "https://a", "alice");
    seed_permission(&shared, "https://a", "bob");

    EnrichIdentities.run(&ctx).await.unwrap();

    assert_eq!(remote.call_count("identity"), 1);
    assert_eq!(remote.calls().last().unwrap().arg, "bob");
    assert_eq!(shared.status().summary.identities, 1);
    assert!(store.load(&key).unwrap().is_none());
}
