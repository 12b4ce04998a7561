// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for engine tests.

use crate::ops::OpContext;
use crate::shared_state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use trawl_core::{FakeClock, LogSink, OpKind, Operation, OperationConfig};
use trawl_remote::{FakeRemote, Throttle, ThrottleConfig};
use trawl_store::CheckpointStore;
use url::Url;

pub(crate) const TENANT_ROOT: &str = "https://contoso-admin.example.com/";

/// Install a fmt subscriber honoring `RUST_LOG`, once per test binary.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Throttle config with millisecond delays so retry paths stay fast
/// under real time.
pub(crate) fn fast_throttle() -> ThrottleConfig {
    ThrottleConfig::default()
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(2))
}

pub(crate) fn operation(kind: OpKind, scope: Option<&str>) -> Operation {
    let mut config = OperationConfig::new(kind);
    if let Some(scope) = scope {
        let url: Url = scope.parse().unwrap();
        config = config.scope(url);
    }
    config.build(&FakeClock::new())
}

/// Build a claimed context around a fake remote, as the worker would.
pub(crate) fn ctx_for(
    remote: &FakeRemote,
    kind: OpKind,
    scope: Option<&str>,
    dir: &TempDir,
) -> (OpContext, Arc<SharedState>) {
    let shared = Arc::new(SharedState::new());
    let op = operation(kind, scope);
    assert!(shared.try_begin(&op));
    let sink: Arc<dyn LogSink> = shared.clone();
    let ctx = OpContext {
        op,
        shared: shared.clone(),
        remote: Arc::new(remote.clone()),
        throttle: Throttle::new(fast_throttle(), sink),
        checkpoints: CheckpointStore::new(dir.path()).unwrap(),
        bearer: "test-bearer".to_string(),
    };
    (ctx, shared)
}

/// Poll the slot until the run completes.
pub(crate) async fn wait_complete(shared: &SharedState) {
    for _ in 0..500 {
        if shared.status().complete {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("operation did not complete in time");
}
