// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote collection API adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from remote calls, classified for the retry policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote signalled throttling; retry after the hint if present.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    /// Network-level fault worth retrying.
    #[error("transient error: {0}")]
    Transient(String),
    /// Anything else; surfaced immediately, never retried.
    #[error("permanent error: {0}")]
    Permanent(String),
}

/// A site collection as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEntry {
    pub url: String,
    pub title: String,
}

/// Full detail for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDetail {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub storage_mb: Option<u64>,
}

/// One role assignment on a securable object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub object_url: String,
    pub principal: String,
    pub role: String,
}

/// Resolved identity detail for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDetail {
    pub login: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Adapter for the rate-limited remote collection API.
///
/// Every method takes the bearer token established by the worker's
/// connector; credential state never lives inside the adapter, so one
/// adapter instance serves runs with different sessions.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// List the tenant's site collections.
    async fn list_sites(&self, bearer: &str) -> Result<Vec<SiteEntry>, RemoteError>;

    /// Fetch full detail for one site.
    async fn site_detail(&self, bearer: &str, url: &str) -> Result<SiteDetail, RemoteError>;

    /// Fetch the role assignments on one site.
    async fn role_assignments(
        &self,
        bearer: &str,
        url: &str,
    ) -> Result<Vec<RoleAssignment>, RemoteError>;

    /// Resolve one principal into an identity record.
    async fn identity(&self, bearer: &str, login: &str) -> Result<IdentityDetail, RemoteError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Arc;

    /// Recorded remote call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RemoteCall {
        pub method: &'static str,
        pub arg: String,
        pub bearer: String,
    }

    #[derive(Default)]
    struct FakeRemoteState {
        sites: Vec<SiteEntry>,
        details: BTreeMap<String, SiteDetail>,
        assignments: BTreeMap<String, Vec<RoleAssignment>>,
        identities: BTreeMap<String, IdentityDetail>,
        /// One-shot failures popped per method before the canned response.
        failures: HashMap<&'static str, VecDeque<RemoteError>>,
        /// Persistent failures keyed by (method, arg).
        unit_failures: HashMap<(&'static str, String), RemoteError>,
        calls: Vec<RemoteCall>,
    }

    /// Fake remote adapter serving scripted responses and failure schedules.
    #[derive(Clone, Default)]
    pub struct FakeRemote {
        inner: Arc<Mutex<FakeRemoteState>>,
    }

    impl FakeRemote {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a site with a matching detail record.
        pub fn add_site(&self, url: &str, title: &str) {
            let mut state = self.inner.lock();
            state.sites.push(SiteEntry {
                url: url.to_string(),
                title: title.to_string(),
            });
            state.details.insert(
                url.to_string(),
                SiteDetail {
                    url: url.to_string(),
                    title: title.to_string(),
                    template: Some("TEAM".to_string()),
                    storage_mb: Some(16),
                },
            );
        }

        pub fn add_assignment(&self, site: &str, principal: &str, role: &str) {
            self.inner
                .lock()
                .assignments
                .entry(site.to_string())
                .or_default()
                .push(RoleAssignment {
                    object_url: site.to_string(),
                    principal: principal.to_string(),
                    role: role.to_string(),
                });
        }

        pub fn add_identity(&self, login: &str, display_name: &str) {
            self.inner.lock().identities.insert(
                login.to_string(),
                IdentityDetail {
                    login: login.to_string(),
                    display_name: Some(display_name.to_string()),
                    email: Some(format!("{login}@contoso.example.com")),
                    source: Some("directory".to_string()),
                },
            );
        }

        /// Queue a one-shot failure for the next call to `method`.
        pub fn fail_next(&self, method: &'static str, err: RemoteError) {
            self.inner
                .lock()
                .failures
                .entry(method)
                .or_default()
                .push_back(err);
        }

        /// Make every call to `method` with `arg` fail.
        pub fn fail_unit(&self, method: &'static str, arg: &str, err: RemoteError) {
            self.inner
                .lock()
                .unit_failures
                .insert((method, arg.to_string()), err);
        }

        /// Remove a persistent unit failure.
        pub fn heal_unit(&self, method: &'static str, arg: &str) {
            self.inner
                .lock()
                .unit_failures
                .remove(&(method, arg.to_string()));
        }

        pub fn calls(&self) -> Vec<RemoteCall> {
            self.inner.lock().calls.clone()
        }

        pub fn call_count(&self, method: &str) -> usize {
            self.inner
                .lock()
                .calls
                .iter()
                .filter(|c| c.method == method)
                .count()
        }

        fn begin(
            &self,
            method: &'static str,
            arg: &str,
            bearer: &str,
        ) -> Result<(), RemoteError> {
            let mut state = self.inner.lock();
            state.calls.push(RemoteCall {
                method,
                arg: arg.to_string(),
                bearer: bearer.to_string(),
            });
            if let Some(queue) = state.failures.get_mut(method) {
                if let Some(err) = queue.pop_front() {
                    return Err(err);
                }
            }
            if let Some(err) = state.unit_failures.get(&(method, arg.to_string())) {
                return Err(err.clone());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteApi for FakeRemote {
        async fn list_sites(&self, bearer: &str) -> Result<Vec<SiteEntry>, RemoteError> {
            self.begin("list_sites", "", bearer)?;
            Ok(self.inner.lock().sites.clone())
        }

        async fn site_detail(&self, bearer: &str, url: &str) -> Result<SiteDetail, RemoteError> {
            self.begin("site_detail", url, bearer)?;
            self.inner
                .lock()
                .details
                .get(url)
                .cloned()
                .ok_or_else(|| RemoteError::Permanent(format!("unknown site: {url}")))
        }

        async fn role_assignments(
            &self,
            bearer: &str,
            url: &str,
        ) -> Result<Vec<RoleAssignment>, RemoteError> {
            self.begin("role_assignments", url, bearer)?;
            Ok(self
                .inner
                .lock()
                .assignments
                .get(url)
                .cloned()
                .unwrap_or_default())
        }

        async fn identity(&self, bearer: &str, login: &str) -> Result<IdentityDetail, RemoteError> {
            self.begin("identity", login, bearer)?;
            self.inner
                .lock()
                .identities
                .get(login)
                .cloned()
                .ok_or_else(|| RemoteError::Permanent(format!("unknown principal: {login}")))
        }
    }
}
