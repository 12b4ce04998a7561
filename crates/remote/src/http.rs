// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-backed implementations of the remote and auth adapters.

use crate::api::{IdentityDetail, RemoteApi, RemoteError, RoleAssignment, SiteDetail, SiteEntry};
use crate::auth::{AuthError, AuthFlows, AuthSession, AuthStrategy};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote collection API over HTTP.
///
/// Maps throttling statuses (429/503) with their `Retry-After` hint to
/// [`RemoteError::RateLimited`], connection-level faults to `Transient`,
/// and every other non-success status to `Permanent`.
pub struct HttpRemote {
    http: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    pub fn new(base: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, base }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        bearer: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| RemoteError::Permanent(format!("bad endpoint {path}: {e}")))?;
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(transient)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            return Err(RemoteError::RateLimited {
                retry_after: retry_after_hint(&response),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Permanent(format!("{status} for {path}")));
        }
        response.json().await.map_err(|e| {
            if e.is_decode() {
                RemoteError::Permanent(format!("invalid response body for {path}: {e}"))
            } else {
                transient(e)
            }
        })
    }
}

fn transient(e: reqwest::Error) -> RemoteError {
    RemoteError::Transient(e.to_string())
}

fn retry_after_hint(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn list_sites(&self, bearer: &str) -> Result<Vec<SiteEntry>, RemoteError> {
        self.get_json(bearer, "api/sites", &[]).await
    }

    async fn site_detail(&self, bearer: &str, url: &str) -> Result<SiteDetail, RemoteError> {
        self.get_json(bearer, "api/sites/detail", &[("url", url)])
            .await
    }

    async fn role_assignments(
        &self,
        bearer: &str,
        url: &str,
    ) -> Result<Vec<RoleAssignment>, RemoteError> {
        self.get_json(bearer, "api/roleassignments", &[("site", url)])
            .await
    }

    async fn identity(&self, bearer: &str, login: &str) -> Result<IdentityDetail, RemoteError> {
        self.get_json(bearer, "api/identities", &[("login", login)])
            .await
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeGrant {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default = "default_poll_interval")]
    interval: u64,
}

fn default_poll_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenPoll {
    access_token: Option<String>,
    error: Option<String>,
}

/// Credential flows over HTTP against the login service.
pub struct HttpAuthFlows {
    http: reqwest::Client,
    login_base: Url,
    /// Upper bound on any polling wait, whatever the grant's expiry says.
    poll_cap: Duration,
}

impl HttpAuthFlows {
    pub fn new(login_base: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            login_base,
            poll_cap: Duration::from_secs(300),
        }
    }

    fn endpoint(&self, path: &str, strategy: AuthStrategy) -> Result<Url, AuthError> {
        self.login_base.join(path).map_err(|e| AuthError::FlowFailed {
            strategy,
            reason: format!("bad login endpoint {path}: {e}"),
        })
    }

    async fn poll_token(
        &self,
        url: Url,
        form: &[(&str, &str)],
        mut interval: Duration,
        deadline: Duration,
        strategy: AuthStrategy,
    ) -> Result<AuthSession, AuthError> {
        let started = std::time::Instant::now();
        while started.elapsed() < deadline {
            tokio::time::sleep(interval).await;
            let poll: TokenPoll = self
                .http
                .post(url.clone())
                .form(form)
                .send()
                .await
                .map_err(|e| flow_failed(strategy, e))?
                .json()
                .await
                .map_err(|e| flow_failed(strategy, e))?;

            if let Some(token) = poll.access_token {
                return Ok(AuthSession {
                    access_token: token,
                    strategy,
                });
            }
            match poll.error.as_deref() {
                Some("authorization_pending") | None => {}
                Some("slow_down") => interval += Duration::from_secs(5),
                Some(other) => {
                    return Err(AuthError::FlowFailed {
                        strategy,
                        reason: other.to_string(),
                    })
                }
            }
        }
        Err(AuthError::FlowFailed {
            strategy,
            reason: "authorization wait expired".to_string(),
        })
    }
}

fn flow_failed(strategy: AuthStrategy, e: reqwest::Error) -> AuthError {
    AuthError::FlowFailed {
        strategy,
        reason: e.to_string(),
    }
}

#[async_trait]
impl AuthFlows for HttpAuthFlows {
    async fn token_reconnect(&self, token: &str, site: &Url) -> Result<AuthSession, AuthError> {
        let strategy = AuthStrategy::TokenReconnect;
        let url = site.join("api/ping").map_err(|e| AuthError::FlowFailed {
            strategy,
            reason: format!("bad site url: {e}"),
        })?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| flow_failed(strategy, e))?;
        if response.status().is_success() {
            Ok(AuthSession {
                access_token: token.to_string(),
                strategy,
            })
        } else {
            Err(AuthError::FlowFailed {
                strategy,
                reason: format!("token rejected with {}", response.status()),
            })
        }
    }

    async fn device_code(&self, client_id: &str, tenant: &str) -> Result<AuthSession, AuthError> {
        let strategy = AuthStrategy::DeviceCode;
        let grant_url = self.endpoint("device/code", strategy)?;
        let grant: DeviceCodeGrant = self
            .http
            .post(grant_url)
            .form(&[("client_id", client_id), ("tenant", tenant)])
            .send()
            .await
            .map_err(|e| flow_failed(strategy, e))?
            .json()
            .await
            .map_err(|e| flow_failed(strategy, e))?;

        tracing::info!(
            user_code = %grant.user_code,
            verification_uri = %grant.verification_uri,
            "device login pending; enter the code at the verification URI"
        );

        let deadline = Duration::from_secs(grant.expires_in).min(self.poll_cap);
        let token_url = self.endpoint("device/token", strategy)?;
        self.poll_token(
            token_url,
            &[("client_id", client_id), ("device_code", &grant.device_code)],
            Duration::from_secs(grant.interval),
            deadline,
            strategy,
        )
        .await
    }

    async fn interactive(&self, client_id: &str, site: &Url) -> Result<AuthSession, AuthError> {
        let strategy = AuthStrategy::Interactive;
        let state = nanoid::nanoid!(19);
        let mut authorize = self.endpoint("authorize", strategy)?;
        authorize
            .query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("resource", site.as_str())
            .append_pair("state", &state);

        open::that(authorize.as_str()).map_err(|e| AuthError::FlowFailed {
            strategy,
            reason: format!("cannot open a browser: {e}"),
        })?;

        let token_url = self.endpoint(&format!("session/{state}/token"), strategy)?;
        self.poll_token(
            token_url,
            &[("client_id", client_id)],
            Duration::from_secs(2),
            self.poll_cap,
            strategy,
        )
        .await
    }
}
