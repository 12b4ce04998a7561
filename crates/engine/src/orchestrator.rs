// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: accepts one operation at a time and runs it in an
//! isolated worker task.
//!
//! The worker shares only the [`SharedState`] slot and the credential
//! material copied at spawn time with the caller's context. Once spawned
//! it runs to completion or failure; there is no cancellation for an
//! in-flight operation.

use crate::ops::{standard_body, OpContext, OperationBody};
use crate::shared_state::{AckError, SharedState, StatusPayload};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use trawl_core::{Clock, CredentialMaterial, LogSink, OpId, Operation, SystemClock};
use trawl_remote::{AuthFlows, Connector, RemoteApi, Throttle, ThrottleConfig};
use trawl_store::{CheckpointStore, StoreError};

/// Errors from starting an operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// Another operation holds the slot; retry after it completes.
    #[error("an operation is already running")]
    AlreadyRunning,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory for checkpoint files.
    pub checkpoint_dir: PathBuf,
    /// Whether the worker runs without an interactive desktop context.
    pub headless: bool,
    /// Retry policy for remote calls.
    pub throttle: ThrottleConfig,
}

impl EngineConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            headless: true,
            throttle: ThrottleConfig::default(),
        }
    }

    trawl_core::setters! {
        set {
            headless: bool,
            throttle: ThrottleConfig,
        }
    }
}

/// Singleton entry point composing the engine.
///
/// Holds the shared slot, the remote and auth adapters, and checkpoint
/// storage. `start` is the only way work enters the system.
pub struct JobOrchestrator<C: Clock = SystemClock> {
    shared: Arc<SharedState>,
    remote: Arc<dyn RemoteApi>,
    flows: Arc<dyn AuthFlows>,
    checkpoints: CheckpointStore,
    throttle_config: ThrottleConfig,
    headless: bool,
    clock: C,
}

impl JobOrchestrator<SystemClock> {
    pub fn new(
        config: EngineConfig,
        remote: Arc<dyn RemoteApi>,
        flows: Arc<dyn AuthFlows>,
    ) -> Result<Self, StoreError> {
        Self::with_clock(config, remote, flows, SystemClock)
    }
}

impl<C: Clock> JobOrchestrator<C> {
    pub fn with_clock(
        config: EngineConfig,
        remote: Arc<dyn RemoteApi>,
        flows: Arc<dyn AuthFlows>,
        clock: C,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            shared: Arc::new(SharedState::new()),
            remote,
            flows,
            checkpoints: CheckpointStore::new(config.checkpoint_dir)?,
            throttle_config: config.throttle,
            headless: config.headless,
            clock,
        })
    }

    /// Handle to the shared slot, for polling and tests.
    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Project the slot into the polling payload.
    pub fn status(&self) -> StatusPayload {
        self.shared.status()
    }

    /// Clear the slot after observing completion.
    pub fn acknowledge(&self) -> Result<(), AckError> {
        self.shared.acknowledge()
    }

    /// Start an operation with its standard body.
    pub fn start(
        &self,
        operation: Operation,
        creds: CredentialMaterial,
    ) -> Result<OpId, StartError> {
        let body = standard_body(operation.kind);
        self.start_with_body(operation, body, creds)
    }

    /// Start an operation with an explicit body.
    ///
    /// Rejects while another operation is running — the check-and-set on
    /// the slot is atomic. On accept, credential material and scope are
    /// copied into a spawned worker task and this call returns
    /// immediately; progress is observed by polling.
    pub fn start_with_body(
        &self,
        operation: Operation,
        body: Arc<dyn OperationBody>,
        creds: CredentialMaterial,
    ) -> Result<OpId, StartError> {
        if !self.shared.try_begin(&operation) {
            return Err(StartError::AlreadyRunning);
        }
        let id = operation.id.clone();
        let worker = Worker {
            shared: self.shared.clone(),
            remote: self.remote.clone(),
            flows: self.flows.clone(),
            checkpoints: self.checkpoints.clone(),
            throttle_config: self.throttle_config.clone(),
            headless: self.headless,
            clock: self.clock.clone(),
            operation,
            body,
            creds,
        };
        tokio::spawn(worker.run());
        Ok(id)
    }
}

/// Everything the worker task owns; built before spawn so the task has
/// no free variables reaching back into the caller's context.
struct Worker<C: Clock> {
    shared: Arc<SharedState>,
    remote: Arc<dyn RemoteApi>,
    flows: Arc<dyn AuthFlows>,
    checkpoints: CheckpointStore,
    throttle_config: ThrottleConfig,
    headless: bool,
    clock: C,
    operation: Operation,
    body: Arc<dyn OperationBody>,
    creds: CredentialMaterial,
}

impl<C: Clock> Worker<C> {
    async fn run(self) {
        let started = self.clock.now();
        let shared = self.shared.clone();
        shared.append_log(format!(
            "operation {} started: {}",
            self.operation.id,
            self.operation.describe()
        ));
        tracing::info!(op_id = %self.operation.id, kind = %self.operation.kind, "operation started");

        // The shared slot is the log sink for everything in this context.
        let sink: Arc<dyn LogSink> = self.shared.clone();

        let connector = Connector::new(
            self.flows.clone(),
            self.creds.clone(),
            self.headless,
            sink.clone(),
        );
        let bearer = match connector.connect(self.operation.scope.as_ref()).await {
            Ok(session) => {
                shared.append_log(format!("authenticated via {}", session.strategy));
                session.access_token
            }
            // Soft failure: the run proceeds; remote calls fail or
            // return partial data on their own terms.
            Err(e) => {
                shared.append_log(format!(
                    "authentication failed: {e}; remote calls may fail or return partial data"
                ));
                tracing::warn!(op_id = %self.operation.id, error = %e, "running degraded");
                String::new()
            }
        };

        let ctx = OpContext {
            op: self.operation.clone(),
            shared: shared.clone(),
            remote: self.remote.clone(),
            throttle: Throttle::new(self.throttle_config.clone(), sink),
            checkpoints: self.checkpoints.clone(),
            bearer,
        };
        let body = self.body.clone();

        // The body runs in its own task so a panic is contained and the
        // slot still reaches a completed state.
        let outcome = tokio::spawn(async move { body.run(&ctx).await }).await;

        let elapsed_ms = self
            .clock
            .now()
            .saturating_duration_since(started)
            .as_millis() as u64;
        match outcome {
            Ok(Ok(summary)) => {
                shared.append_log(format!("operation complete: {summary}"));
                tracing::info!(op_id = %self.operation.id, elapsed_ms, "operation complete");
            }
            Ok(Err(e)) => {
                shared.append_log(format!("operation failed: {e}"));
                shared.set_error(e.to_string());
                tracing::error!(op_id = %self.operation.id, elapsed_ms, error = %e, "operation failed");
            }
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "operation body panicked".to_string()
                } else {
                    format!("operation body aborted: {join_err}")
                };
                shared.append_log(&reason);
                shared.set_error(reason);
                tracing::error!(op_id = %self.operation.id, elapsed_ms, "operation body died");
            }
        }
        shared.finish();
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
