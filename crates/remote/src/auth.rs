// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-authentication inside the worker context.
//!
//! A session established on the control surface does not cross into the
//! worker, and a token captured against the admin endpoint may be invalid
//! for a different site's endpoint. The connector therefore walks a
//! prioritized chain of credential flows, scope-aware, stopping at the
//! first success. Each attempt is logged to the operation log.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use trawl_core::{tenant_name, CredentialMaterial, LogSink};
use url::Url;

/// Which flow produced (or failed to produce) a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    TokenReconnect,
    DeviceCode,
    Interactive,
    CapturedToken,
}

trawl_core::simple_display! {
    AuthStrategy {
        TokenReconnect => "token reconnection",
        DeviceCode => "device code",
        Interactive => "interactive",
        CapturedToken => "captured token",
    }
}

/// An established session usable for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub strategy: AuthStrategy,
}

/// Errors from authentication flows
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("{strategy} flow failed: {reason}")]
    FlowFailed {
        strategy: AuthStrategy,
        reason: String,
    },
    #[error("all authentication strategies exhausted")]
    Exhausted,
}

/// Adapter over the individual credential flows.
///
/// The connector owns strategy selection; implementations only know how
/// to run one flow each way.
#[async_trait]
pub trait AuthFlows: Send + Sync {
    /// Validate a captured bearer token against a site endpoint.
    async fn token_reconnect(&self, token: &str, site: &Url) -> Result<AuthSession, AuthError>;

    /// Run the device-code flow for a tenant. Server-interactive, but the
    /// polling wait is bounded — this never blocks indefinitely.
    async fn device_code(&self, client_id: &str, tenant: &str) -> Result<AuthSession, AuthError>;

    /// Run the browser-based interactive flow.
    async fn interactive(&self, client_id: &str, site: &Url) -> Result<AuthSession, AuthError>;
}

/// Walks the credential-flow chain to establish a session in the worker.
pub struct Connector {
    flows: Arc<dyn AuthFlows>,
    creds: CredentialMaterial,
    headless: bool,
    log: Arc<dyn LogSink>,
}

impl Connector {
    pub fn new(
        flows: Arc<dyn AuthFlows>,
        creds: CredentialMaterial,
        headless: bool,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            flows,
            creds,
            headless,
            log,
        }
    }

    /// Establish a session for the given scope (tenant root when `None`).
    ///
    /// Failure here is soft: the caller logs it and proceeds; subsequent
    /// remote calls fail or return partial data on their own terms.
    pub async fn connect(&self, scope: Option<&Url>) -> Result<AuthSession, AuthError> {
        let target = scope.unwrap_or(&self.creds.tenant_root);

        if self.headless {
            if let Some(session) = self.connect_headless(target).await {
                return Ok(session);
            }
        } else if let Some(session) = self.connect_interactive(target).await {
            return Ok(session);
        }

        self.log
            .append("auth: all strategies failed; proceeding without a session");
        tracing::error!(target = %target, "authentication exhausted");
        Err(AuthError::Exhausted)
    }

    async fn connect_headless(&self, target: &Url) -> Option<AuthSession> {
        // Same-site reconnection with the captured token comes first; a
        // token captured against a different site's endpoint would be
        // rejected there, so it is not even attempted cross-site.
        if self.creds.is_same_site(target) {
            if let Some(token) = &self.creds.access_token {
                self.log
                    .append(&format!("auth: attempting token reconnection to {target}"));
                match self.flows.token_reconnect(token, target).await {
                    Ok(session) => {
                        self.log.append("auth: token reconnection succeeded");
                        return Some(session);
                    }
                    Err(e) => self.log.append(&format!("auth: {e}")),
                }
            }
        }

        if let Some(client_id) = &self.creds.client_id {
            match tenant_name(target) {
                Some(tenant) => {
                    self.log.append(&format!(
                        "auth: attempting device-code flow for tenant {tenant}"
                    ));
                    match self.flows.device_code(client_id, &tenant).await {
                        Ok(session) => {
                            self.log.append("auth: device-code flow succeeded");
                            return Some(session);
                        }
                        Err(e) => self.log.append(&format!("auth: {e}")),
                    }
                }
                None => self
                    .log
                    .append(&format!("auth: cannot derive a tenant name from {target}")),
            }
        }

        None
    }

    async fn connect_interactive(&self, target: &Url) -> Option<AuthSession> {
        // Interactive first: it yields a token scoped for arbitrary sites,
        // which the captured admin-scoped token is not.
        if let Some(client_id) = &self.creds.client_id {
            self.log
                .append(&format!("auth: attempting interactive flow for {target}"));
            match self.flows.interactive(client_id, target).await {
                Ok(session) => {
                    self.log.append("auth: interactive flow succeeded");
                    return Some(session);
                }
                Err(e) => self.log.append(&format!("auth: {e}")),
            }
        }

        if let Some(token) = &self.creds.access_token {
            self.log.append("auth: falling back to the captured token");
            return Some(AuthSession {
                access_token: token.clone(),
                strategy: AuthStrategy::CapturedToken,
            });
        }

        None
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// Recorded flow attempt
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FlowAttempt {
        pub strategy: AuthStrategy,
        /// Token, tenant, or site — whatever identifies the attempt.
        pub detail: String,
    }

    #[derive(Default)]
    struct FakeFlowsState {
        token_reconnect_ok: bool,
        device_code_ok: bool,
        interactive_ok: bool,
        attempts: Vec<FlowAttempt>,
    }

    /// Fake flow adapter; every flow fails unless told otherwise.
    #[derive(Clone, Default)]
    pub struct FakeFlows {
        inner: Arc<Mutex<FakeFlowsState>>,
    }

    impl FakeFlows {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn token_reconnect_ok(self) -> Self {
            self.inner.lock().token_reconnect_ok = true;
            self
        }

        pub fn device_code_ok(self) -> Self {
            self.inner.lock().device_code_ok = true;
            self
        }

        pub fn interactive_ok(self) -> Self {
            self.inner.lock().interactive_ok = true;
            self
        }

        pub fn attempts(&self) -> Vec<FlowAttempt> {
            self.inner.lock().attempts.clone()
        }

        fn record(&self, strategy: AuthStrategy, detail: String, ok: bool) -> Result<AuthSession, AuthError> {
            self.inner.lock().attempts.push(FlowAttempt { strategy, detail });
            if ok {
                Ok(AuthSession {
                    access_token: format!("fake-{strategy}-token").replace(' ', "-"),
                    strategy,
                })
            } else {
                Err(AuthError::FlowFailed {
                    strategy,
                    reason: "scripted failure".to_string(),
                })
            }
        }
    }

    #[async_trait]
    impl AuthFlows for FakeFlows {
        async fn token_reconnect(&self, token: &str, site: &Url) -> Result<AuthSession, AuthError> {
            let ok = self.inner.lock().token_reconnect_ok;
            self.record(
                AuthStrategy::TokenReconnect,
                format!("{token}@{site}"),
                ok,
            )
        }

        async fn device_code(&self, _client_id: &str, tenant: &str) -> Result<AuthSession, AuthError> {
            let ok = self.inner.lock().device_code_ok;
            self.record(AuthStrategy::DeviceCode, tenant.to_string(), ok)
        }

        async fn interactive(&self, _client_id: &str, site: &Url) -> Result<AuthSession, AuthError> {
            let ok = self.inner.lock().interactive_ok;
            self.record(AuthStrategy::Interactive, site.to_string(), ok)
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
