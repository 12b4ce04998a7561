// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The thread-safe slot bridging the worker and the control surface.
//!
//! One in-flight operation at a time. The worker owns every write for the
//! run's duration; the control surface polls [`SharedState::status`] and
//! writes only through [`SharedState::acknowledge`] after observing
//! completion. The log is append-only and order-preserving within a run.

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use trawl_core::{LogSink, Operation};
use trawl_store::{DataStore, StoreCounts};

/// Errors from clearing the slot
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AckError {
    #[error("operation has not completed")]
    NotComplete,
}

/// Status projection polled by the control surface.
///
/// `error` is rendered verbatim when present; completion is indicated by
/// `complete` alone, regardless of error state.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub running: bool,
    pub complete: bool,
    pub error: Option<String>,
    pub log: Vec<String>,
    pub summary: StoreCounts,
}

#[derive(Default)]
struct SharedInner {
    running: bool,
    complete: bool,
    error: Option<String>,
    log: Vec<String>,
    site_url: Option<String>,
    data: DataStore,
}

/// Cross-boundary operation state. Typed fields behind one mutex; never a
/// loosely-typed map.
#[derive(Default)]
pub struct SharedState {
    inner: Mutex<SharedInner>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim the slot for an operation.
    ///
    /// Returns false while another operation is running. On success the
    /// run state is reset; cached data persists across runs.
    pub fn try_begin(&self, operation: &Operation) -> bool {
        let mut inner = self.inner.lock();
        if inner.running {
            return false;
        }
        inner.running = true;
        inner.complete = false;
        inner.error = None;
        inner.log = Vec::new();
        inner.site_url = operation.scope.as_ref().map(|u| u.to_string());
        true
    }

    /// Append one line to the operation log. Entries are never reordered
    /// or removed during a run.
    pub fn append_log(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.inner.lock().log.push(line);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.inner.lock().error = Some(message.into());
    }

    /// Mark the run finished. Completion is guaranteed even on failure,
    /// so the control surface never observes a run that hangs forever.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        inner.complete = true;
    }

    /// Clear the slot after the control surface has observed completion.
    pub fn acknowledge(&self) -> Result<(), AckError> {
        let mut inner = self.inner.lock();
        if !inner.complete {
            return Err(AckError::NotComplete);
        }
        inner.running = false;
        inner.complete = false;
        inner.error = None;
        inner.log = Vec::new();
        inner.site_url = None;
        Ok(())
    }

    /// Snapshot the slot for the polling control surface. Non-blocking
    /// beyond the lock; never waits on the worker.
    pub fn status(&self) -> StatusPayload {
        let inner = self.inner.lock();
        StatusPayload {
            running: inner.running,
            complete: inner.complete,
            error: inner.error.clone(),
            log: inner.log.clone(),
            summary: inner.data.counts(),
        }
    }

    /// Scope hint recorded for the current run, if any.
    pub fn site_url(&self) -> Option<String> {
        self.inner.lock().site_url.clone()
    }

    /// Run a closure against the data store under the lock.
    pub fn with_data<T>(&self, f: impl FnOnce(&mut DataStore) -> T) -> T {
        f(&mut self.inner.lock().data)
    }
}

impl LogSink for SharedState {
    fn append(&self, line: &str) {
        self.append_log(line);
    }
}

#[cfg(test)]
#[path = "shared_state_tests.rs"]
mod tests;
