//! Audit sink that forwards events to the tracing subscriber.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::entities::audit::{AuditEvent, AuditSeverity};

use super::r#trait::AuditSink;

/// Logs every event through `tracing` at a level matching its severity.
/// Useful as a default sink when no dedicated audit pipeline is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type.as_str();
        match event.severity {
            AuditSeverity::Info => {
                info!(event = event_type, payload = %event.payload, "audit event")
            }
            AuditSeverity::Warning => {
                warn!(event = event_type, payload = %event.payload, "audit event")
            }
            AuditSeverity::Critical => {
                error!(event = event_type, payload = %event.payload, "audit event")
            }
        }
    }
}
