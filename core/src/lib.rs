//! # TrustDomain Core
//!
//! Core domain layer for the TrustDomain multi-tenant SSO backend.
//! This crate contains the token lifecycle engine: signed token issuance,
//! validation, refresh rotation, revocation, and suspicious-use detection,
//! together with the narrow boundary contracts it depends on (revocation
//! storage, audit sink, secret provider).

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    reasons, AccessClaims, AuditEvent, AuditEventType, AuditSeverity, Claims, KeyAlgorithm,
    RefreshClaims, SessionContext, SigningKey, TokenMetadata, TokenPair,
    ACCESS_TOKEN_EXPIRY_SECONDS, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};
pub use errors::{DomainError, DomainResult, TokenError};
pub use repositories::{
    AuditSink, EnvSecretProvider, MemoryRevocationStore, MockAuditSink, NoopAuditSink,
    RevocationStore, SecretProvider, StaticSecretProvider, TracingAuditSink,
};
pub use services::{
    IssueOptions, MaintenanceConfig, MaintenanceReport, RevocationRegistry, SigningKeyStore,
    TokenAnalytics, TokenMaintenanceService, TokenService, TokenServiceConfig, TokenStats,
    ValidateOptions, ValidationOutcome,
};
