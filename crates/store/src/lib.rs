// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! trawl-store: durable checkpoints and the collected-entity cache.

mod cache;
mod checkpoint;

pub use cache::{DataStore, MergeOutcome, StoreCounts};
pub use checkpoint::{Checkpoint, CheckpointKey, CheckpointStore, StoreError};

/// Current epoch milliseconds.
pub(crate) fn epoch_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
