// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation model: what the control surface asks the engine to run.

use crate::clock::Clock;
use crate::id::OpId;
use serde::{Deserialize, Serialize};
use url::Url;

/// What kind of collection work an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Walk the tenant's site collections and cache a record per site.
    Enumeration,
    /// Collect role assignments per site (or for one scoped site).
    PermissionCollection,
    /// Resolve collected principals into full identity records.
    Enrichment,
}

crate::simple_display! {
    OpKind {
        Enumeration => "enumeration",
        PermissionCollection => "permissions",
        Enrichment => "enrichment",
    }
}

/// Configuration for creating a new operation
#[derive(Debug, Clone)]
pub struct OperationConfig {
    kind: OpKind,
    scope: Option<Url>,
}

impl OperationConfig {
    pub fn new(kind: OpKind) -> Self {
        Self { kind, scope: None }
    }

    crate::setters! {
        option {
            scope: Url,
        }
    }

    pub fn build(self, clock: &impl Clock) -> Operation {
        Operation {
            id: OpId::new(),
            kind: self.kind,
            scope: self.scope,
            created_at_ms: clock.epoch_ms(),
        }
    }
}

/// One requested unit of long-running work.
///
/// Owned by the orchestrator from accept until the control surface
/// acknowledges completion and the shared slot is cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OpId,
    pub kind: OpKind,
    /// Single-site target, or `None` for tenant-wide.
    pub scope: Option<Url>,
    pub created_at_ms: u64,
}

impl Operation {
    /// Human-readable form for log lines.
    pub fn describe(&self) -> String {
        match &self.scope {
            Some(url) => format!("{} (site {})", self.kind, url),
            None => format!("{} (tenant-wide)", self.kind),
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
