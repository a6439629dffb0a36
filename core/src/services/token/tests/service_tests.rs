//! Issuance and validation tests for the token service

use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::domain::entities::audit::AuditEventType;
use crate::domain::entities::metadata::reasons;
use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::services::token::{IssueOptions, ValidateOptions, ValidationOutcome};

use super::{harness, session, TestService};

fn token_err(result: DomainResult<ValidationOutcome>) -> TokenError {
    match result.unwrap_err() {
        DomainError::Token(e) => e,
        other => panic!("expected token error, got {other}"),
    }
}

/// Signs arbitrary claims under the service's current key.
fn sign_json(service: &TestService, claims: &JsonValue) -> String {
    let (kid, key, algorithm) = service.key_store().signing_key().unwrap();
    let mut header = jsonwebtoken::Header::new(algorithm);
    header.kid = Some(kid);
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

fn base_claims(now: i64) -> JsonValue {
    json!({
        "type": "access",
        "iss": "trustdomain",
        "sub": "user-1",
        "aud": "crm",
        "exp": now + 3600,
        "nbf": now - 10,
        "iat": now,
        "jti": Uuid::new_v4().to_string(),
        "org_id": "org-1",
        "scopes": ["sso:login"],
        "session_id": "sess-1",
    })
}

#[tokio::test]
async fn test_issue_returns_well_formed_pair() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    assert_eq!(pair.access_token.split('.').count(), 3);
    assert_eq!(pair.refresh_token.split('.').count(), 3);
    assert_ne!(pair.access_token, pair.refresh_token);
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 3600);
    assert_eq!(pair.scope, "sso:login profile:read");
}

#[tokio::test]
async fn test_issued_pair_validates() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let outcome = h
        .service
        .validate(&pair.access_token, &ValidateOptions::default())
        .await
        .unwrap();

    match &outcome.claims {
        Claims::Access(access) => {
            assert_eq!(access.sub, "user-1");
            assert_eq!(access.aud, "crm");
            assert!(access.refresh_jti.is_some());
        }
        other => panic!("expected access claims, got {other:?}"),
    }
    assert!(!outcome.key_id.is_empty());
    assert_eq!(outcome.suspicious_score, 0.0);

    assert_eq!(h.audit.count_of(AuditEventType::TokenIssued).await, 1);
    assert_eq!(h.audit.count_of(AuditEventType::TokenValidated).await, 1);
}

#[tokio::test]
async fn test_validate_rejects_garbage() {
    let h = harness().await;

    for garbage in ["", "not-a-token", "a.b", "a.b.c.d", "..", "a..c"] {
        let err = token_err(h.service.validate(garbage, &ValidateOptions::default()).await);
        assert_eq!(err, TokenError::MalformedToken, "input: {garbage:?}");
    }
}

#[tokio::test]
async fn test_validate_rejects_unknown_kid() {
    let h = harness().await;

    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
    header.kid = Some("no-such-key".to_string());
    let token = jsonwebtoken::encode(
        &header,
        &base_claims(Utc::now().timestamp()),
        &jsonwebtoken::EncodingKey::from_secret(b"attacker-key"),
    )
    .unwrap();

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(err, TokenError::KeyUnavailable);
}

#[tokio::test]
async fn test_validate_rejects_tampered_payload() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let mut parts: Vec<&str> = pair.access_token.split('.').collect();
    let forged = sign_json(&h.service, &base_claims(Utc::now().timestamp()));
    let forged_payload = forged.split('.').nth(1).unwrap().to_string();
    parts[1] = &forged_payload;
    let tampered = parts.join(".");

    let err = token_err(
        h.service
            .validate(&tampered, &ValidateOptions::default())
            .await,
    );
    assert_eq!(err, TokenError::InvalidSignature);
}

#[tokio::test]
async fn test_validate_rejects_expired() {
    let h = harness().await;
    let now = Utc::now().timestamp();

    let mut claims = base_claims(now - 7200);
    claims["exp"] = json!(now - 3600);
    let token = sign_json(&h.service, &claims);

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(err, TokenError::Expired);
    assert_eq!(h.service.stats().expired, 1);
}

#[tokio::test]
async fn test_validate_rejects_not_yet_valid() {
    let h = harness().await;
    let now = Utc::now().timestamp();

    let mut claims = base_claims(now);
    claims["nbf"] = json!(now + 600);
    let token = sign_json(&h.service, &claims);

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(err, TokenError::NotYetValid);
}

#[tokio::test]
async fn test_validate_reports_missing_claim() {
    let h = harness().await;

    let mut claims = base_claims(Utc::now().timestamp());
    claims.as_object_mut().unwrap().remove("jti");
    let token = sign_json(&h.service, &claims);

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(
        err,
        TokenError::MissingClaim {
            claim: "jti".to_string()
        }
    );
}

#[tokio::test]
async fn test_validate_rejects_foreign_issuer() {
    let h = harness().await;

    let mut claims = base_claims(Utc::now().timestamp());
    claims["iss"] = json!("someone-else");
    let token = sign_json(&h.service, &claims);

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(err, TokenError::InvalidClaims);
}

#[tokio::test]
async fn test_validate_rejects_untyped_payload() {
    let h = harness().await;

    // all required claims present but no variant tag
    let mut claims = base_claims(Utc::now().timestamp());
    claims.as_object_mut().unwrap().remove("type");
    let token = sign_json(&h.service, &claims);

    let err = token_err(h.service.validate(&token, &ValidateOptions::default()).await);
    assert_eq!(err, TokenError::InvalidClaims);
}

#[tokio::test]
async fn test_validate_enforces_max_age() {
    let h = harness().await;
    let now = Utc::now().timestamp();

    let mut claims = base_claims(now - 120);
    claims["exp"] = json!(now + 3600);
    let token = sign_json(&h.service, &claims);

    let options = ValidateOptions {
        max_token_age_seconds: Some(60),
        ..ValidateOptions::default()
    };
    let err = token_err(h.service.validate(&token, &options).await);
    assert_eq!(err, TokenError::TokenTooOld);

    let relaxed = ValidateOptions {
        max_token_age_seconds: Some(600),
        ..ValidateOptions::default()
    };
    assert!(h.service.validate(&token, &relaxed).await.is_ok());
}

#[tokio::test]
async fn test_revoked_token_fails_before_signature_work() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    assert!(h
        .service
        .revoke(&pair.access_token, reasons::LOGOUT, Some("user-1"))
        .await
        .unwrap());

    let err = token_err(
        h.service
            .validate(&pair.access_token, &ValidateOptions::default())
            .await,
    );
    assert_eq!(
        err,
        TokenError::Revoked {
            reason: reasons::LOGOUT.to_string()
        }
    );

    // second revocation is a no-op
    assert!(!h
        .service
        .revoke(&pair.access_token, reasons::LOGOUT, None)
        .await
        .unwrap());
    assert_eq!(h.audit.count_of(AuditEventType::TokenRevoked).await, 1);
}

#[tokio::test]
async fn test_client_binding_round_trip() {
    let h = harness().await;
    let issue = IssueOptions {
        bind_to_client: true,
        ..IssueOptions::default()
    };
    let pair = h.service.issue(&session(), &issue).await.unwrap();

    let matching = ValidateOptions {
        require_client_binding: true,
        client_ip: Some("203.0.113.10".to_string()),
        user_agent: Some("test-agent/1.0".to_string()),
        ..ValidateOptions::default()
    };
    assert!(h.service.validate(&pair.access_token, &matching).await.is_ok());

    let wrong_ip = ValidateOptions {
        require_client_binding: true,
        client_ip: Some("198.51.100.99".to_string()),
        user_agent: Some("test-agent/1.0".to_string()),
        ..ValidateOptions::default()
    };
    let err = token_err(h.service.validate(&pair.access_token, &wrong_ip).await);
    assert_eq!(err, TokenError::BindingMismatch);
}

#[tokio::test]
async fn test_binding_required_but_absent() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let options = ValidateOptions {
        require_client_binding: true,
        client_ip: Some("203.0.113.10".to_string()),
        user_agent: Some("test-agent/1.0".to_string()),
        ..ValidateOptions::default()
    };
    let err = token_err(h.service.validate(&pair.access_token, &options).await);
    assert_eq!(err, TokenError::BindingMismatch);
}

#[tokio::test]
async fn test_fingerprint_stamped_when_enabled() {
    let h = harness().await;
    let issue = IssueOptions {
        enable_fingerprint: true,
        ..IssueOptions::default()
    };
    let pair = h.service.issue(&session(), &issue).await.unwrap();

    let outcome = h
        .service
        .validate(&pair.access_token, &ValidateOptions::default())
        .await
        .unwrap();
    match outcome.claims {
        Claims::Access(access) => assert!(access.fingerprint.is_some()),
        other => panic!("expected access claims, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_expiry_applies() {
    let h = harness().await;
    let issue = IssueOptions {
        custom_expiry_seconds: Some(120),
        ..IssueOptions::default()
    };
    let pair = h.service.issue(&session(), &issue).await.unwrap();
    assert_eq!(pair.expires_in, 120);

    let outcome = h
        .service
        .validate(&pair.access_token, &ValidateOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.claims.exp() - outcome.claims.iat(), 120);
}

#[tokio::test]
async fn test_usage_history_accumulates() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let options = ValidateOptions {
        client_ip: Some("203.0.113.10".to_string()),
        ..ValidateOptions::default()
    };
    h.service.validate(&pair.access_token, &options).await.unwrap();
    h.service.validate(&pair.access_token, &options).await.unwrap();

    let hash = td_shared::utils::hashing::hash_token(&pair.access_token);
    let metadata = h
        .service
        .registry()
        .metadata_for(&hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metadata.use_count, 2);
    assert_eq!(metadata.last_used_ip.as_deref(), Some("203.0.113.10"));
    assert!(metadata.last_used_at.is_some());
}

#[tokio::test]
async fn test_usage_not_recorded_when_disabled() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let options = ValidateOptions {
        update_usage_stats: false,
        ..ValidateOptions::default()
    };
    h.service.validate(&pair.access_token, &options).await.unwrap();

    let hash = td_shared::utils::hashing::hash_token(&pair.access_token);
    let metadata = h
        .service
        .registry()
        .metadata_for(&hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metadata.use_count, 0);
}

#[tokio::test]
async fn test_revoke_all_for_subject() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let mut other = session();
    other.user_id = "user-2".to_string();
    let other_pair = h
        .service
        .issue(&other, &IssueOptions::default())
        .await
        .unwrap();

    // access and refresh both die
    let count = h
        .service
        .revoke_all_for_subject("user-1", reasons::ADMIN)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let err = token_err(
        h.service
            .validate(&pair.access_token, &ValidateOptions::default())
            .await,
    );
    assert!(matches!(err, TokenError::Revoked { .. }));

    // other subjects unaffected
    assert!(h
        .service
        .validate(&other_pair.access_token, &ValidateOptions::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_stats_snapshot_tracks_operations() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    h.service
        .validate(&pair.access_token, &ValidateOptions::default())
        .await
        .unwrap();
    let _ = h.service.validate("garbage", &ValidateOptions::default()).await;
    h.service
        .revoke(&pair.access_token, reasons::LOGOUT, None)
        .await
        .unwrap();

    let stats = h.service.stats();
    assert_eq!(stats.issued, 1);
    assert_eq!(stats.validated, 1);
    assert_eq!(stats.validation_failures, 1);
    assert_eq!(stats.revoked, 1);
}

#[tokio::test]
async fn test_jwks_empty_for_symmetric_keys() {
    let h = harness().await;
    h.service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    let jwks = h.service.jwks();
    assert_eq!(jwks["keys"], json!([]));
}

#[tokio::test]
async fn test_validation_failures_are_audited() {
    let h = harness().await;
    let _ = h.service.validate("garbage", &ValidateOptions::default()).await;
    assert_eq!(
        h.audit.count_of(AuditEventType::TokenValidationFailed).await,
        1
    );
}
