//! No-op audit sink for deployments without an audit subsystem.

use async_trait::async_trait;

use crate::domain::entities::audit::AuditEvent;

use super::r#trait::AuditSink;

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn emit(&self, _event: AuditEvent) {}
}
