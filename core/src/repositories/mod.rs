//! Boundary contracts the token engine depends on, with in-process
//! implementations for single-instance deployments and mocks for tests.

pub mod audit;
pub mod revocation;
pub mod secret;

pub use audit::{AuditSink, MockAuditSink, NoopAuditSink, TracingAuditSink};
pub use revocation::{MemoryRevocationStore, RevocationStore};
pub use secret::{EnvSecretProvider, SecretProvider, StaticSecretProvider};
