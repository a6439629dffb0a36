//! Mock audit sink for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::audit::{AuditEvent, AuditEventType};

use super::r#trait::AuditSink;

/// Captures emitted events so tests can assert on them.
#[derive(Default)]
pub struct MockAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Count of events matching a type
    pub async fn count_of(&self, event_type: AuditEventType) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn emit(&self, event: AuditEvent) {
        self.events.write().await.push(event);
    }
}
