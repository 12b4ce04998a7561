// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-operation progress markers.
//!
//! One JSON file per (operation kind, scope) pair under the state
//! directory. A checkpoint records the units already completed so a
//! restarted operation continues at the next unit instead of the first.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use trawl_core::OpKind;
use url::Url;

/// Errors from checkpoint persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("checkpoint cursor regressed: persisted {persisted}, attempted {attempted}")]
    CursorRegressed { persisted: u64, attempted: u64 },
}

/// Progress record for one resumable operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unit keys completed so far, in completion order.
    pub completed: Vec<String>,
    /// Number of completed units. Strictly advances across saves.
    pub cursor: u64,
    pub updated_at_ms: u64,
}

impl Checkpoint {
    /// Whether a unit of work was already completed in an earlier run.
    pub fn is_done(&self, unit: &str) -> bool {
        self.completed.iter().any(|u| u == unit)
    }

    /// Record a completed unit. Re-recording a known unit does not
    /// advance the cursor.
    pub fn record_unit(&mut self, unit: impl Into<String>) {
        let unit = unit.into();
        if !self.is_done(&unit) {
            self.completed.push(unit);
            self.cursor = self.completed.len() as u64;
        }
        self.updated_at_ms = crate::epoch_ms_now();
    }
}

/// Key identifying one operation's checkpoint: kind plus optional scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointKey {
    kind: OpKind,
    scope: Option<String>,
}

impl CheckpointKey {
    pub fn new(kind: OpKind) -> Self {
        Self { kind, scope: None }
    }

    pub fn scoped(kind: OpKind, scope: &Url) -> Self {
        Self {
            kind,
            scope: Some(scope.as_str().to_string()),
        }
    }

    /// Filesystem-safe stem for this key.
    fn file_stem(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}-{}", self.kind, sanitize(scope)),
            None => self.kind.to_string(),
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// File-backed checkpoint storage.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Open (creating if needed) a checkpoint directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &CheckpointKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Load the checkpoint for a key, if one was persisted.
    pub fn load(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint = serde_json::from_slice(&bytes)?;
        Ok(Some(checkpoint))
    }

    /// Persist a checkpoint. Saves must advance: a cursor behind the
    /// persisted one is rejected.
    pub fn save(&self, key: &CheckpointKey, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        if let Some(existing) = self.load(key)? {
            if existing.cursor > checkpoint.cursor {
                return Err(StoreError::CursorRegressed {
                    persisted: existing.cursor,
                    attempted: checkpoint.cursor,
                });
            }
        }
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(checkpoint)?)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(key = %key.file_stem(), cursor = checkpoint.cursor, "checkpoint saved");
        Ok(())
    }

    /// Remove the checkpoint for a key. Missing checkpoints are fine.
    pub fn clear(&self, key: &CheckpointKey) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
