//! Secret provider trait for fetching root key material.

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Source of the root key-derivation seed for signing keys.
///
/// Consulted once at key-store initialization and on scheduled rotation,
/// never per validation. A failure here is fatal to key generation: issuance
/// cannot proceed, though validation of existing tokens still works against
/// retained historical keys.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the root key material.
    async fn root_key_material(&self) -> DomainResult<Vec<u8>>;
}
