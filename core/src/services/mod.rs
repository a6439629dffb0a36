//! Business services containing the token engine's domain logic.

pub mod token;

// Re-export commonly used types
pub use token::{
    IssueOptions, MaintenanceConfig, MaintenanceReport, RevocationRegistry, SigningKeyStore,
    TokenAnalytics, TokenMaintenanceService, TokenService, TokenServiceConfig, TokenStats,
    ValidateOptions, ValidationOutcome,
};
