//! Shared utilities and common types for TrustDomain server
//!
//! This crate provides common functionality used across all server modules:
//! - Environment configuration
//! - Request context types
//! - Hashing utilities for token material

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::Environment;
pub use types::RequestContext;
pub use utils::hashing;
