//! Token lifecycle engine
//!
//! This module handles all token-related operations including:
//! - Access/refresh token pair issuance
//! - Ordered fail-closed validation (format, blacklist, signature, temporal,
//!   claims, client binding, usage, risk scoring)
//! - Refresh rotation with bounded chain depth
//! - Revocation registry with capacity-bounded blacklist
//! - Signing key rotation and JWKS publication
//! - Background purging of expired records

pub mod codec;

mod analytics;
mod config;
mod key_store;
mod maintenance;
mod registry;
mod risk;
mod service;

#[cfg(test)]
mod tests;

pub use analytics::{TokenAnalytics, TokenStats};
pub use config::{Rs256KeyConfig, TokenServiceConfig};
pub use key_store::SigningKeyStore;
pub use maintenance::{MaintenanceConfig, MaintenanceReport, TokenMaintenanceService};
pub use registry::RevocationRegistry;
pub use risk::{score_usage, RiskAssessment, RiskConfig};
pub use service::{IssueOptions, TokenService, ValidateOptions, ValidationOutcome};
