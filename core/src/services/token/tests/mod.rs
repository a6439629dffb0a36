//! Unit tests for the token engine

mod risk_tests;
mod service_tests;

use std::sync::Arc;

use crate::domain::entities::token::SessionContext;
use crate::repositories::audit::MockAuditSink;
use crate::repositories::revocation::MemoryRevocationStore;
use crate::repositories::secret::StaticSecretProvider;
use crate::services::token::{TokenService, TokenServiceConfig};

type TestService = TokenService<MemoryRevocationStore, MockAuditSink>;

struct TestHarness {
    service: TestService,
    store: Arc<MemoryRevocationStore>,
    audit: Arc<MockAuditSink>,
}

async fn harness() -> TestHarness {
    harness_with(TokenServiceConfig::default()).await
}

async fn harness_with(config: TokenServiceConfig) -> TestHarness {
    let store = Arc::new(MemoryRevocationStore::new(config.max_blacklist_size));
    let audit = Arc::new(MockAuditSink::new());
    let secrets = StaticSecretProvider::new(b"unit-test-root-material".to_vec());

    let service = TokenService::new(Arc::clone(&store), Arc::clone(&audit), &secrets, config)
        .await
        .unwrap();

    TestHarness {
        service,
        store,
        audit,
    }
}

fn session() -> SessionContext {
    SessionContext {
        product_key: "crm".to_string(),
        user_id: "user-1".to_string(),
        organization_id: "org-1".to_string(),
        external_user_id: Some("crm-user-1".to_string()),
        email: Some("user1@example.com".to_string()),
        scopes: vec!["sso:login".to_string(), "profile:read".to_string()],
        session_id: "sess-1".to_string(),
        client_ip: Some("203.0.113.10".to_string()),
        user_agent: Some("test-agent/1.0".to_string()),
    }
}
