// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation bodies: the work a worker performs.
//!
//! A body receives an explicit context of inputs at spawn time — the
//! shared slot, the remote adapter, throttle protection, checkpoint
//! storage, and the bearer token the connector established. Bodies route
//! every remote call through the throttle, checkpoint after each
//! completed unit, and merge results into the shared data store.

mod enrich;
mod enumerate;
mod permissions;

pub use enrich::EnrichIdentities;
pub use enumerate::EnumerateSites;
pub use permissions::CollectPermissions;

use crate::shared_state::SharedState;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use trawl_core::{OpKind, Operation};
use trawl_remote::{RemoteApi, RemoteError, Throttle};
use trawl_store::{CheckpointKey, CheckpointStore, StoreError};

/// Errors an operation body can fail with
#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Failed(String),
}

/// Everything a body needs, handed over at spawn time.
pub struct OpContext {
    pub op: Operation,
    pub shared: Arc<SharedState>,
    pub remote: Arc<dyn RemoteApi>,
    pub throttle: Throttle,
    pub checkpoints: CheckpointStore,
    /// Bearer token from the connector; empty when authentication was
    /// exhausted and the run proceeds degraded.
    pub bearer: String,
}

impl OpContext {
    pub fn log(&self, line: impl Into<String>) {
        self.shared.append_log(line);
    }

    /// Checkpoint key for this run: operation kind plus scope.
    pub fn checkpoint_key(&self) -> CheckpointKey {
        match &self.op.scope {
            Some(url) => CheckpointKey::scoped(self.op.kind, url),
            None => CheckpointKey::new(self.op.kind),
        }
    }
}

/// One operation's executable body.
///
/// Returns a one-line result summary on success. Any error is caught at
/// the orchestration boundary and recorded into the shared slot.
#[async_trait]
pub trait OperationBody: Send + Sync + 'static {
    async fn run(&self, ctx: &OpContext) -> Result<String, OpError>;
}

/// The standard body for an operation kind.
pub fn standard_body(kind: OpKind) -> Arc<dyn OperationBody> {
    match kind {
        OpKind::Enumeration => Arc::new(EnumerateSites),
        OpKind::PermissionCollection => Arc::new(CollectPermissions),
        OpKind::Enrichment => Arc::new(EnrichIdentities),
    }
}
