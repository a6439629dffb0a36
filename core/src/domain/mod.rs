//! Domain layer containing the token engine's business entities.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
