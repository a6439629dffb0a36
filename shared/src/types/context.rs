//! Request context carried from the transport layer into domain services.

use serde::{Deserialize, Serialize};

/// Network/device context of the request currently being handled.
///
/// The HTTP layer fills this in from connection metadata; domain services
/// treat it as opaque input for client binding and anomaly detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address as observed by the edge
    pub client_ip: Option<String>,

    /// User-Agent header value
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Creates a context with both fields populated
    pub fn new(client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_ip: Some(client_ip.into()),
            user_agent: Some(user_agent.into()),
        }
    }

    /// Creates an empty context (no network metadata available)
    pub fn empty() -> Self {
        Self::default()
    }
}
