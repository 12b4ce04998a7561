// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log sink seam between the worker context and the shared operation log.
//!
//! Everything that runs inside a worker — auth attempts, throttle retries,
//! the operation body itself — writes through a [`LogSink`] instead of
//! printing. The engine installs the shared slot as the sink for the run,
//! so the control surface sees the same lines it would otherwise lose to
//! a detached context.

/// Destination for operation diagnostic lines.
pub trait LogSink: Send + Sync {
    /// Append one line to the sink. Order of appends is preserved.
    fn append(&self, line: &str);
}

/// Sink that forwards lines to `tracing` only.
///
/// Used where no operation is in flight (e.g. exercising a connector or
/// throttle outside a run).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, line: &str) {
        tracing::info!("{line}");
    }
}
