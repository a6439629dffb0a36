//! Suspicious-use scoring over token metadata history.
//!
//! Best-effort anomaly detection, not a security boundary: the additive
//! heuristics below flag usage patterns that correlate with token theft and
//! can force revocation past the hard threshold, but a clean score proves
//! nothing.

use chrono::{Duration, Utc};
use td_shared::types::RequestContext;

use crate::domain::entities::metadata::TokenMetadata;

/// Scoring configuration
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Soft threshold: flag without revoking
    pub suspicious_activity_threshold: f64,
    /// Hard threshold: force revocation
    pub revoke_threshold: f64,
    /// Use count considered excessive for a short-lived token
    pub excessive_use_count: u64,
    /// Hours of dormancy after which a first use looks like a leaked token
    pub dormant_reactivation_hours: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            suspicious_activity_threshold: 0.7,
            revoke_threshold: 0.9,
            excessive_use_count: 100,
            dormant_reactivation_hours: 24,
        }
    }
}

/// Outcome of scoring one validation attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Additive score clamped to [0, 1]
    pub score: f64,
    /// Score crossed the soft threshold
    pub flagged: bool,
    /// Score crossed the hard threshold; the token must be revoked
    pub revoke: bool,
    /// Which heuristics fired, for audit payloads
    pub signals: Vec<&'static str>,
}

/// Scores a validation attempt against the token's usage history.
///
/// The IP baseline is the most recent prior use, falling back to the
/// issuance IP for a token that has never been used.
pub fn score_usage(
    metadata: &TokenMetadata,
    context: &RequestContext,
    config: &RiskConfig,
) -> RiskAssessment {
    let mut score: f64 = 0.0;
    let mut signals = Vec::new();

    // Excessive reuse of what should be a short-lived token
    if metadata.use_count > config.excessive_use_count {
        score += 0.3;
        signals.push("excessive_reuse");
    }

    // A never-used token suddenly activated long after issuance
    if metadata.use_count == 0 {
        let dormant_for = Utc::now() - metadata.issued_at;
        if dormant_for > Duration::hours(config.dormant_reactivation_hours) {
            score += 0.4;
            signals.push("dormant_reactivation");
        }
    }

    // Request IP differs from the last one seen for this token
    if let (Some(current_ip), Some(known_ip)) =
        (context.client_ip.as_deref(), metadata.last_known_ip())
    {
        if current_ip != known_ip {
            score += 0.6;
            signals.push("ip_change");
        }
    }

    let score = score.clamp(0.0, 1.0);

    RiskAssessment {
        score,
        flagged: score >= config.suspicious_activity_threshold,
        revoke: score >= config.revoke_threshold,
        signals,
    }
}
