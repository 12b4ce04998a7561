// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn site_key_is_the_url() {
    let e = CachedEntity::Site(SiteRecord {
        url: "https://contoso.example.com/sites/hr".into(),
        title: "HR".into(),
        template: None,
        storage_mb: None,
    });
    assert_eq!(e.natural_key(), "https://contoso.example.com/sites/hr");
    assert_eq!(e.kind_name(), "site");
}

#[test]
fn permission_key_is_the_assignment_tuple() {
    let e = CachedEntity::Permission(PermissionRecord {
        object_url: "https://contoso.example.com/sites/hr".into(),
        principal: "alice@contoso.example.com".into(),
        role: "Full Control".into(),
    });
    assert_eq!(
        e.natural_key(),
        "https://contoso.example.com/sites/hr|alice@contoso.example.com|Full Control"
    );
}

#[test]
fn identity_key_is_the_login() {
    let e = CachedEntity::Identity(IdentityRecord {
        login: "alice@contoso.example.com".into(),
        display_name: Some("Alice".into()),
        email: None,
        source: None,
    });
    assert_eq!(e.natural_key(), "alice@contoso.example.com");
}

#[test]
fn entity_serde_tags_the_variant() {
    let e = CachedEntity::Identity(IdentityRecord {
        login: "bob".into(),
        display_name: None,
        email: None,
        source: None,
    });
    let json = serde_json::to_string(&e).unwrap();
    assert!(json.contains("\"type\":\"identity\""));
    let back: CachedEntity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
}

proptest! {
    // Different assignment tuples never collide on the natural key.
    #[test]
    fn permission_keys_distinguish_tuples(
        obj in "[a-z]{1,8}", principal in "[a-z]{1,8}", role in "[a-z]{1,8}",
        obj2 in "[a-z]{1,8}", principal2 in "[a-z]{1,8}", role2 in "[a-z]{1,8}",
    ) {
        let a = CachedEntity::Permission(PermissionRecord {
            object_url: obj.clone(), principal: principal.clone(), role: role.clone(),
        });
        let b = CachedEntity::Permission(PermissionRecord {
            object_url: obj2.clone(), principal: principal2.clone(), role: role2.clone(),
        });
        let same = obj == obj2 && principal == principal2 && role == role2;
        prop_assert_eq!(a.natural_key() == b.natural_key(), same);
    }
}
