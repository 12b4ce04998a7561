// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential material captured from the control surface's session.
//!
//! Captured once at spawn time and copied into the worker context —
//! authenticated sessions do not cross execution-context boundaries, so
//! the worker re-establishes its own from this material.

use serde::{Deserialize, Serialize};
use url::Url;

/// Token/tenant/client triple used to re-authenticate inside a worker.
///
/// Never mutated after capture. The token may already be expired, or may
/// be scoped to an administrative endpoint and invalid for another site;
/// the connector's fallback chain exists for exactly that reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialMaterial {
    /// Bearer token from the control surface's session, if one was present.
    pub access_token: Option<String>,
    /// Root URL of the tenant the session was established against.
    pub tenant_root: Url,
    /// Application client identifier for the device-code and interactive flows.
    pub client_id: Option<String>,
}

impl CredentialMaterial {
    pub fn new(tenant_root: Url) -> Self {
        Self {
            access_token: None,
            tenant_root,
            client_id: None,
        }
    }

    crate::setters! {
        option {
            access_token: String,
            client_id: String,
        }
    }

    /// True when the requested scope points at the same host the material
    /// was captured against (same-site reconnection is then possible).
    pub fn is_same_site(&self, scope: &Url) -> bool {
        scope.host_str() == self.tenant_root.host_str()
    }
}

/// Derive a tenant name from a scope URL: the first host label, cut at
/// the first hyphen or dot.
///
/// `https://contoso-admin.example.com/` and `https://contoso.example.com/x`
/// both derive `contoso`. The rule is deliberately this literal; unusual
/// hosts derive whatever falls out of it.
pub fn tenant_name(scope: &Url) -> Option<String> {
    let host = scope.host_str()?;
    let end = host.find(['-', '.']).unwrap_or(host.len());
    if end == 0 {
        return None;
    }
    Some(host[..end].to_string())
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
