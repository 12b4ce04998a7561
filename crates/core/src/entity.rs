// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached entity records collected by operations.

use serde::{Deserialize, Serialize};

/// A site collection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mb: Option<u64>,
}

/// One role assignment: who holds what role on which object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// URL of the securable object the assignment applies to.
    pub object_url: String,
    /// Principal login the role is granted to.
    pub principal: String,
    pub role: String,
}

/// An enriched identity record for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Directory the identity resolved from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Any entity the data store can hold.
///
/// Keyed by a stable natural identifier so re-collecting an item after a
/// checkpoint resume merges onto the existing record instead of
/// duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CachedEntity {
    Site(SiteRecord),
    Permission(PermissionRecord),
    Identity(IdentityRecord),
}

impl CachedEntity {
    /// The stable natural key this entity merges under.
    pub fn natural_key(&self) -> String {
        match self {
            CachedEntity::Site(s) => s.url.clone(),
            CachedEntity::Permission(p) => {
                format!("{}|{}|{}", p.object_url, p.principal, p.role)
            }
            CachedEntity::Identity(i) => i.login.clone(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CachedEntity::Site(_) => "site",
            CachedEntity::Permission(_) => "permission",
            CachedEntity::Identity(_) => "identity",
        }
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
