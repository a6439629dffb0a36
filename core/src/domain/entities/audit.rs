//! Audit event entity emitted to the external audit sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Event types emitted by the token engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // Issuance
    TokenIssued,

    // Validation
    TokenValidated,
    TokenValidationFailed,

    // Revocation and rotation
    TokenRevoked,
    TokenRefreshed,
    RotationLimitExceeded,
    KeyRotated,

    // Security
    SuspiciousActivity,
}

impl AuditEventType {
    /// String form used by downstream sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenIssued => "TOKEN_ISSUED",
            Self::TokenValidated => "TOKEN_VALIDATED",
            Self::TokenValidationFailed => "TOKEN_VALIDATION_FAILED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::RotationLimitExceeded => "ROTATION_LIMIT_EXCEEDED",
            Self::KeyRotated => "KEY_ROTATED",
            Self::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
        }
    }
}

/// Severity attached to an audit event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// A single audit event. The token engine only produces these; persistence
/// and hash chaining are the audit subsystem's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    /// Unique identifier for the event
    pub id: Uuid,

    /// What happened
    pub event_type: AuditEventType,

    /// How loudly downstream should care
    pub severity: AuditSeverity,

    /// Structured event details (token ids, subjects, reasons, scores)
    pub payload: JsonValue,

    /// When the event was produced
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates a new audit event
    pub fn new(event_type: AuditEventType, severity: AuditSeverity, payload: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            severity,
            payload,
            created_at: Utc::now(),
        }
    }
}
