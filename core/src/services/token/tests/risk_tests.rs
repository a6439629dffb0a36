//! Suspicious-use scoring tests

use chrono::{Duration, Utc};
use td_shared::types::RequestContext;
use td_shared::utils::hashing;

use crate::domain::entities::audit::AuditEventType;
use crate::domain::entities::metadata::{reasons, TokenMetadata};
use crate::errors::{DomainError, TokenError};
use crate::repositories::revocation::RevocationStore;
use crate::services::token::{
    score_usage, IssueOptions, RiskConfig, TokenServiceConfig, ValidateOptions,
};

use super::{harness, harness_with, session};

fn metadata() -> TokenMetadata {
    TokenMetadata::new(
        "hash-1".to_string(),
        "jti-1".to_string(),
        "user-1".to_string(),
        "crm".to_string(),
        Utc::now(),
        Utc::now() + Duration::hours(1),
        Some("203.0.113.10".to_string()),
        Some("test-agent/1.0".to_string()),
    )
}

fn context(ip: &str) -> RequestContext {
    RequestContext::new(ip, "test-agent/1.0")
}

#[test]
fn test_clean_usage_scores_zero() {
    let mut m = metadata();
    m.record_use(Some("203.0.113.10"));

    let assessment = score_usage(&m, &context("203.0.113.10"), &RiskConfig::default());
    assert_eq!(assessment.score, 0.0);
    assert!(!assessment.flagged);
    assert!(!assessment.revoke);
    assert!(assessment.signals.is_empty());
}

#[test]
fn test_excessive_reuse_signal() {
    let mut m = metadata();
    m.use_count = 150;
    m.last_used_ip = Some("203.0.113.10".to_string());

    let assessment = score_usage(&m, &context("203.0.113.10"), &RiskConfig::default());
    assert_eq!(assessment.score, 0.3);
    assert_eq!(assessment.signals, vec!["excessive_reuse"]);
    assert!(!assessment.flagged);
}

#[test]
fn test_dormant_reactivation_signal() {
    let mut m = metadata();
    m.issued_at = Utc::now() - Duration::hours(30);

    let assessment = score_usage(&m, &context("203.0.113.10"), &RiskConfig::default());
    assert_eq!(assessment.score, 0.4);
    assert_eq!(assessment.signals, vec!["dormant_reactivation"]);
}

#[test]
fn test_ip_change_signal_against_last_use() {
    let mut m = metadata();
    m.record_use(Some("198.51.100.7"));

    let assessment = score_usage(&m, &context("203.0.113.99"), &RiskConfig::default());
    assert_eq!(assessment.score, 0.6);
    assert_eq!(assessment.signals, vec!["ip_change"]);
}

#[test]
fn test_ip_baseline_falls_back_to_issuance() {
    let mut m = metadata();
    m.use_count = 1;
    m.last_used_ip = None;

    // matches the issuance IP, no signal
    let assessment = score_usage(&m, &context("203.0.113.10"), &RiskConfig::default());
    assert!(assessment.signals.is_empty());
}

#[test]
fn test_missing_request_ip_scores_no_ip_signal() {
    let m = metadata();
    let assessment = score_usage(&m, &RequestContext::empty(), &RiskConfig::default());
    assert_eq!(assessment.score, 0.0);
}

#[test]
fn test_combined_signals_cross_hard_threshold() {
    let mut m = metadata();
    m.use_count = 150;
    m.last_used_ip = Some("198.51.100.7".to_string());

    let assessment = score_usage(&m, &context("203.0.113.99"), &RiskConfig::default());
    assert!((assessment.score - 0.9).abs() < f64::EPSILON);
    assert!(assessment.flagged);
    assert!(assessment.revoke);
    assert_eq!(assessment.signals, vec!["excessive_reuse", "ip_change"]);
}

#[test]
fn test_score_is_clamped_to_one() {
    let mut m = metadata();
    m.issued_at = Utc::now() - Duration::hours(48);

    // dormant (0.4) + ip change (0.6)
    let assessment = score_usage(&m, &context("203.0.113.99"), &RiskConfig::default());
    assert_eq!(assessment.score, 1.0);
    assert!(assessment.revoke);
}

#[tokio::test]
async fn test_hard_threshold_forces_revocation() {
    let h = harness().await;
    let pair = h
        .service
        .issue(&session(), &IssueOptions::default())
        .await
        .unwrap();

    // poison the history so the next validation scores 0.9
    let hash = hashing::hash_token(&pair.access_token);
    let mut m = h.store.find_metadata(&hash).await.unwrap().unwrap();
    m.use_count = 150;
    m.last_used_ip = Some("198.51.100.7".to_string());
    h.store.update_metadata(m).await.unwrap();

    let options = ValidateOptions {
        client_ip: Some("203.0.113.99".to_string()),
        ..ValidateOptions::default()
    };
    let result = h.service.validate(&pair.access_token, &options).await;
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::Revoked { ref reason }))
            if reason == reasons::SUSPICIOUS_ACTIVITY
    ));

    assert!(h.store.is_blacklisted(&hash).await.unwrap());
    assert_eq!(h.audit.count_of(AuditEventType::SuspiciousActivity).await, 1);
    let stats = h.service.stats();
    assert_eq!(stats.suspicious_flags, 1);
    assert_eq!(stats.revoked, 1);
}

#[tokio::test]
async fn test_soft_threshold_flags_without_revoking() {
    let config = TokenServiceConfig {
        risk: RiskConfig {
            suspicious_activity_threshold: 0.5,
            revoke_threshold: 0.95,
            ..RiskConfig::default()
        },
        ..TokenServiceConfig::default()
    };
    let h = harness_with(config).await;
    let session = session();
    let pair = h
        .service
        .issue(&session, &IssueOptions::default())
        .await
        .unwrap();

    // ip change alone (0.6) flags but stays under the hard threshold
    let options = ValidateOptions {
        client_ip: Some("203.0.113.99".to_string()),
        ..ValidateOptions::default()
    };
    let outcome = h.service.validate(&pair.access_token, &options).await.unwrap();
    assert!((outcome.suspicious_score - 0.6).abs() < f64::EPSILON);

    assert_eq!(h.audit.count_of(AuditEventType::SuspiciousActivity).await, 1);
    assert_eq!(h.service.stats().suspicious_flags, 1);

    // still valid afterwards
    assert!(h
        .service
        .validate(&pair.access_token, &options)
        .await
        .is_ok());
}
