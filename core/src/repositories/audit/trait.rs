//! Audit sink trait defining the boundary to the security-event subsystem.

use async_trait::async_trait;

use crate::domain::entities::audit::AuditEvent;

/// Fire-and-forget sink for security events.
///
/// The token engine emits events on issuance, validation outcomes, forced
/// revocation, and key rotation. Delivery is best-effort: no return value is
/// awaited for correctness, and implementations must swallow their own
/// failures rather than propagate them into token operations. Persistence
/// and tamper-evident hash chaining live behind this boundary.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Emit a single event.
    async fn emit(&self, event: AuditEvent);
}
