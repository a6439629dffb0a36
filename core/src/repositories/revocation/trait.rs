//! Revocation store trait defining the interface for blacklist and
//! token-metadata persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::metadata::TokenMetadata;
use crate::errors::DomainResult;

/// Storage contract for the revocation registry.
///
/// The engine treats this as a narrow key-value surface so single-instance
/// deployments can use the in-memory store while multi-instance deployments
/// plug in an external one without touching token logic.
///
/// # Consistency
/// Writes must be visible to subsequent reads from any task as soon as the
/// call returns; revocation tolerates no eventual-consistency window.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Persist a freshly issued token's metadata record.
    ///
    /// Must reject a record whose `token_hash` or `token_id` is already
    /// present; identifier reuse is never legitimate.
    async fn save_metadata(&self, metadata: TokenMetadata) -> DomainResult<()>;

    /// Look up metadata by token hash.
    async fn find_metadata(&self, token_hash: &str) -> DomainResult<Option<TokenMetadata>>;

    /// Look up metadata by the token id embedded in the payload. Used when
    /// only the `jti` is known, e.g. revoking an access token through its
    /// paired refresh token.
    async fn find_by_token_id(&self, token_id: &str) -> DomainResult<Option<TokenMetadata>>;

    /// Replace an existing metadata record (usage stats, revocation stamp).
    ///
    /// Returns `false` when no record exists under the hash.
    async fn update_metadata(&self, metadata: TokenMetadata) -> DomainResult<bool>;

    /// All metadata records for a subject, for bulk revocation.
    async fn find_by_subject(&self, subject: &str) -> DomainResult<Vec<TokenMetadata>>;

    /// Insert a token hash into the blacklist. Write-once; inserting an
    /// already-present hash is a no-op.
    async fn insert_blacklist(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Blacklist membership check. On the hot path of every validation.
    async fn is_blacklisted(&self, token_hash: &str) -> DomainResult<bool>;

    /// Current number of blacklist entries.
    async fn blacklist_len(&self) -> DomainResult<usize>;

    /// Drop metadata records and blacklist entries whose tokens are past
    /// natural expiry. Returns `(metadata_purged, blacklist_purged)`.
    async fn purge_expired(&self) -> DomainResult<(usize, usize)>;
}
