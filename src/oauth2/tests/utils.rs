use serde_json::{json, Value};

use super::helpers::{app, claims, defaults, MockUsers};
use crate::error::Error;
use crate::oauth2::{
    build_oidc_claims_from_scopes, determine_audience, extract_i64_claim,
    extract_scopes_from_claims, extract_string_claim, extract_user_attributes,
    fetch_user_attributes_and_groups, join_scopes, parse_scopes, resolve_token_config,
    standard_oidc_scope, trusted_issuers, GrantType, TokenType,
};

#[test]
fn scopes_split_on_single_spaces() {
    assert_eq!(parse_scopes("  openid  profile email "), vec!["openid", "profile", "email"]);
    assert!(parse_scopes("   ").is_empty());
    assert_eq!(
        join_scopes(&["openid".to_string(), "email".to_string()]),
        "openid email"
    );
    assert_eq!(join_scopes(&[]), "");
}

#[test]
fn audience_priority() {
    assert_eq!(determine_audience("aud", "res", "tok", "def"), "aud");
    assert_eq!(determine_audience("", "res", "tok", "def"), "res");
    assert_eq!(determine_audience("", "", "tok", "def"), "tok");
    assert_eq!(determine_audience("", "", "", "def"), "def");
}

#[test]
fn claim_extraction() {
    let payload = claims(json!({"sub": "user-1", "iat": 1_760_000_000.9, "n": "7"}));
    assert_eq!(extract_string_claim(&payload, "sub").expect("sub"), "user-1");
    assert_eq!(extract_i64_claim(&payload, "iat").expect("iat"), 1_760_000_000);
    match extract_string_claim(&payload, "iat") {
        Err(Error::InvalidClaimType(name)) => assert_eq!(name, "iat"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        extract_i64_claim(&payload, "n"),
        Err(Error::InvalidClaimType(_))
    ));
    assert!(matches!(
        extract_string_claim(&payload, "aud"),
        Err(Error::MissingClaim(_))
    ));
}

#[test]
fn scope_claim_wins_over_authorized_permissions() {
    let both = claims(json!({"scope": "read", "authorized_permissions": "write"}));
    assert_eq!(extract_scopes_from_claims(&both, true), vec!["read"]);

    let permissions_only = claims(json!({"scope": "", "authorized_permissions": "write admin"}));
    assert_eq!(extract_scopes_from_claims(&permissions_only, true), vec!["write", "admin"]);
    assert!(extract_scopes_from_claims(&permissions_only, false).is_empty());
    assert!(extract_scopes_from_claims(&claims(json!({"scope": 5})), true).is_empty());
}

#[test]
fn user_attributes_exclude_registered_claims() {
    let payload = claims(json!({
        "sub": "u", "iss": "i", "aud": "a", "exp": 1, "nbf": 1, "iat": 1, "jti": "j",
        "scope": "s", "client_id": "c", "act": {"sub": "x"},
        "email": "a@b.com", "grant_type": "authorization_code", "userType": "employee"
    }));
    assert_eq!(
        extract_user_attributes(&payload),
        claims(json!({
            "email": "a@b.com",
            "grant_type": "authorization_code",
            "userType": "employee"
        }))
    );
}

#[test]
fn token_config_resolution() {
    let defaults = defaults();
    let global = resolve_token_config(None, TokenType::Access, &defaults);
    assert_eq!(global.issuer, defaults.issuer);
    assert_eq!(global.validity_period, 3600);
    assert_eq!(
        resolve_token_config(None, TokenType::Refresh, &defaults).validity_period,
        86400
    );

    let tenant = app(json!({
        "token": {
            "issuer": "https://tenant",
            "access_token": {"validity_period": 0},
            "id_token": {"validity_period": 120}
        }
    }));
    let access = resolve_token_config(Some(&tenant), TokenType::Access, &defaults);
    assert_eq!(access.issuer, "https://tenant");
    assert_eq!(access.validity_period, 3600);
    let id = resolve_token_config(Some(&tenant), TokenType::Id, &defaults);
    assert_eq!(id.validity_period, 120);

    let mut no_refresh = defaults.clone();
    no_refresh.refresh_validity_period = 0;
    assert_eq!(
        resolve_token_config(Some(&tenant), TokenType::Refresh, &no_refresh).validity_period,
        3600
    );
}

#[test]
fn trusted_issuers_follow_the_application() {
    let defaults = defaults();
    let issuers = trusted_issuers(None, &defaults);
    assert_eq!(issuers.len(), 1);
    assert!(issuers.contains(&defaults.issuer));

    let tenant = app(json!({"token": {"access_token": {"issuer": "https://api.tenant"}}}));
    let issuers = trusted_issuers(Some(&tenant), &defaults);
    assert!(issuers.contains("https://api.tenant"));
    assert!(issuers.contains(&defaults.issuer));
}

#[test]
fn oidc_claims_need_mapping_allow_list_and_value() {
    let attributes = claims(json!({
        "name": "Ada",
        "given_name": Value::Null,
        "email": "a@b.com",
        "department": "R&D"
    }));
    let scopes = vec!["profile".to_string(), "email".to_string(), "corp".to_string()];

    let tenant = app(json!({
        "token": {"id_token": {
            "user_attributes": ["name", "given_name", "department"],
            "scope_claims": {"corp": ["department"], "email": []}
        }}
    }));
    assert_eq!(
        build_oidc_claims_from_scopes(&scopes, &attributes, Some(&tenant)),
        claims(json!({"name": "Ada", "department": "R&D"}))
    );

    let no_allow_list = app(json!({"token": {"id_token": {}}}));
    assert!(build_oidc_claims_from_scopes(&scopes, &attributes, Some(&no_allow_list)).is_empty());
    assert!(build_oidc_claims_from_scopes(&scopes, &attributes, None).is_empty());
    assert!(build_oidc_claims_from_scopes(&[], &attributes, Some(&tenant)).is_empty());
}

#[test]
fn fetches_attributes_and_groups() {
    let users = MockUsers {
        groups: vec!["admins".to_string()],
        ..MockUsers::with_attributes(json!({"email": "a@b.com"}))
    };
    let (attributes, groups) =
        fetch_user_attributes_and_groups(&users, "user-1", false).expect("attributes");
    assert_eq!(attributes, claims(json!({"email": "a@b.com"})));
    assert!(groups.is_empty());
    assert!(users.group_requests.lock().expect("lock").is_empty());

    let (_, groups) =
        fetch_user_attributes_and_groups(&users, "user-1", true).expect("attributes");
    assert_eq!(groups, vec!["admins"]);

    let (attributes, _) = fetch_user_attributes_and_groups(&MockUsers::default(), "user-2", false)
        .expect("no attributes");
    assert!(attributes.is_empty());

    let malformed = MockUsers::with_attributes(json!(["not", "an", "object"]));
    match fetch_user_attributes_and_groups(&malformed, "user-3", false) {
        Err(Error::UserLookup(reason)) => assert!(reason.contains("unmarshal")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn null_attribute_document_is_empty() {
    let users = MockUsers {
        groups: vec!["staff".to_string()],
        ..MockUsers::with_attributes(Value::Null)
    };
    let (attributes, groups) =
        fetch_user_attributes_and_groups(&users, "user-4", true).expect("null attributes");
    assert!(attributes.is_empty());
    assert_eq!(groups, vec!["staff"]);
}

#[test]
fn grant_types_and_standard_scopes() {
    for grant in GrantType::ALL {
        assert_eq!(GrantType::parse(grant.as_str()), Some(grant));
        assert_eq!(grant.to_string().parse::<GrantType>().expect("grant"), grant);
    }
    assert_eq!(GrantType::parse("password"), None);
    assert!(matches!(
        "password".parse::<GrantType>(),
        Err(Error::UnsupportedGrantType(_))
    ));

    let email = standard_oidc_scope("email").expect("email scope");
    assert_eq!(email.claims, &["email", "email_verified"]);
    assert_eq!(standard_oidc_scope("profile").expect("profile").claims.len(), 14);
    assert!(standard_oidc_scope("offline_access").is_none());
}
