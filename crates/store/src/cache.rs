// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Central cache of collected entities.
//!
//! Accumulates across operation runs. Merge is idempotent because
//! checkpoint-resumed operations re-collect items from before the last
//! saved checkpoint; the second merge of an identical entity must not
//! duplicate or corrupt the first.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use trawl_core::{CachedEntity, IdentityRecord, PermissionRecord, SiteRecord};

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    /// Entity was already present and identical; nothing changed.
    Unchanged,
}

/// Entity counts for the status summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub sites: usize,
    pub permissions: usize,
    pub identities: usize,
}

/// In-memory entity cache, keyed by natural identifier per entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataStore {
    sites: BTreeMap<String, SiteRecord>,
    permissions: BTreeMap<String, PermissionRecord>,
    identities: BTreeMap<String, IdentityRecord>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an entity under its natural key.
    pub fn merge(&mut self, entity: CachedEntity) -> MergeOutcome {
        let key = entity.natural_key();
        match entity {
            CachedEntity::Site(site) => merge_into(&mut self.sites, key, site),
            CachedEntity::Permission(perm) => merge_into(&mut self.permissions, key, perm),
            CachedEntity::Identity(identity) => merge_into(&mut self.identities, key, identity),
        }
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            sites: self.sites.len(),
            permissions: self.permissions.len(),
            identities: self.identities.len(),
        }
    }

    /// URLs of all cached sites, in key order.
    pub fn site_urls(&self) -> Vec<String> {
        self.sites.keys().cloned().collect()
    }

    /// Distinct principals across all cached permission records.
    pub fn principals(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .permissions
            .values()
            .map(|p| p.principal.as_str())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    pub fn get_site(&self, url: &str) -> Option<&SiteRecord> {
        self.sites.get(url)
    }

    pub fn get_identity(&self, login: &str) -> Option<&IdentityRecord> {
        self.identities.get(login)
    }
}

fn merge_into<T: PartialEq>(map: &mut BTreeMap<String, T>, key: String, value: T) -> MergeOutcome {
    match map.get(&key) {
        Some(existing) if *existing == value => MergeOutcome::Unchanged,
        Some(_) => {
            map.insert(key, value);
            MergeOutcome::Updated
        }
        None => {
            map.insert(key, value);
            MergeOutcome::Inserted
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
