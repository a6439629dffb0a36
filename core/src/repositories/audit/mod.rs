//! Audit sink boundary.

mod r#trait;
pub use r#trait::AuditSink;

mod noop;
pub use noop::NoopAuditSink;

mod tracing;
pub use self::tracing::TracingAuditSink;

mod mock;
pub use mock::MockAuditSink;
