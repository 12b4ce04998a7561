// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn creds() -> CredentialMaterial {
    CredentialMaterial::new("https://contoso-admin.example.com/".parse().unwrap())
        .access_token("tok-123")
        .client_id("client-abc")
}

#[test]
fn capture_keeps_all_three_fields() {
    let c = creds();
    assert_eq!(c.access_token.as_deref(), Some("tok-123"));
    assert_eq!(c.client_id.as_deref(), Some("client-abc"));
    assert_eq!(c.tenant_root.host_str(), Some("contoso-admin.example.com"));
}

#[test]
fn same_site_compares_hosts() {
    let c = creds();
    let same: Url = "https://contoso-admin.example.com/teams/hr".parse().unwrap();
    let other: Url = "https://contoso.example.com/".parse().unwrap();
    assert!(c.is_same_site(&same));
    assert!(!c.is_same_site(&other));
}

#[parameterized(
    admin_host = { "https://contoso-admin.example.com/", "contoso" },
    plain_host = { "https://contoso.example.com/sites/hr", "contoso" },
    hyphen_before_dot = { "https://north-wind.example.com/", "north" },
    single_label = { "https://localhost/", "localhost" },
)]
fn tenant_name_cuts_at_first_hyphen_or_dot(url: &str, expected: &str) {
    let url: Url = url.parse().unwrap();
    assert_eq!(tenant_name(&url).as_deref(), Some(expected));
}

#[test]
fn tenant_name_is_none_without_host() {
    let url: Url = "file:///tmp/x".parse().unwrap();
    assert_eq!(tenant_name(&url), None);
}
