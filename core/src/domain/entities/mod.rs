//! Domain entities representing core token-engine objects.

pub mod audit;
pub mod key;
pub mod metadata;
pub mod token;

// Re-export commonly used types
pub use audit::{AuditEvent, AuditEventType, AuditSeverity};
pub use key::{KeyAlgorithm, SigningKey};
pub use metadata::{reasons, TokenMetadata};
pub use token::{
    AccessClaims, Claims, RefreshClaims, SessionContext, TokenPair,
    ACCESS_TOKEN_EXPIRY_SECONDS, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};
