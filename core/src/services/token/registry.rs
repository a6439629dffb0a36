//! Revocation registry: blacklist bookkeeping plus per-token usage metadata.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use td_shared::utils::hashing;

use crate::domain::entities::metadata::TokenMetadata;
use crate::domain::entities::token::Claims;
use crate::errors::DomainResult;
use crate::repositories::revocation::RevocationStore;

/// Domain-level wrapper over the revocation store.
///
/// Owns the hashing convention (tokens are always addressed by the SHA-256
/// of their serialized form) and the terminal-state rules for metadata.
pub struct RevocationRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for RevocationRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RevocationStore> RevocationRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Hash used to address a serialized token everywhere in the registry
    pub fn token_hash(token: &str) -> String {
        hashing::hash_token(token)
    }

    /// Registers metadata for a freshly issued token. Rejects identifier
    /// reuse via the store's uniqueness guarantees.
    pub async fn record_issued(
        &self,
        token: &str,
        claims: &Claims,
        source_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> DomainResult<()> {
        let metadata = TokenMetadata::new(
            Self::token_hash(token),
            claims.jti().to_string(),
            claims.sub().to_string(),
            claims.aud().to_string(),
            timestamp(claims.iat()),
            timestamp(claims.exp()),
            source_ip.map(str::to_string),
            user_agent.map(str::to_string),
        );
        self.store.save_metadata(metadata).await
    }

    pub async fn metadata_for(&self, token_hash: &str) -> DomainResult<Option<TokenMetadata>> {
        self.store.find_metadata(token_hash).await
    }

    pub async fn is_revoked(&self, token_hash: &str) -> DomainResult<bool> {
        self.store.is_blacklisted(token_hash).await
    }

    /// Updates usage stats after a successful validation. Records that have
    /// reached a terminal state (revoked or expired) are left untouched.
    pub async fn record_use(
        &self,
        token_hash: &str,
        client_ip: Option<&str>,
    ) -> DomainResult<Option<TokenMetadata>> {
        let Some(mut metadata) = self.store.find_metadata(token_hash).await? else {
            return Ok(None);
        };
        if metadata.is_revoked() || metadata.is_expired() {
            return Ok(Some(metadata));
        }

        metadata.record_use(client_ip);
        self.store.update_metadata(metadata.clone()).await?;
        Ok(Some(metadata))
    }

    /// Revokes a serialized token. Returns `true` when this call performed
    /// the transition, `false` when the token was already revoked.
    pub async fn revoke_token(
        &self,
        token: &str,
        reason: &str,
        revoked_by: Option<&str>,
    ) -> DomainResult<bool> {
        self.revoke_hash(&Self::token_hash(token), reason, revoked_by)
            .await
    }

    /// Revokes by token hash.
    pub async fn revoke_hash(
        &self,
        token_hash: &str,
        reason: &str,
        revoked_by: Option<&str>,
    ) -> DomainResult<bool> {
        if self.store.is_blacklisted(token_hash).await? {
            return Ok(false);
        }

        // Blacklist entries outlive their tokens only until natural expiry;
        // without metadata we assume the longest possible remaining lifetime.
        let expires_at = match self.store.find_metadata(token_hash).await? {
            Some(metadata) => metadata.expires_at,
            None => Utc::now() + Duration::days(30),
        };

        self.store.insert_blacklist(token_hash, expires_at).await?;

        if let Some(mut metadata) = self.store.find_metadata(token_hash).await? {
            if metadata.revoke(reason, revoked_by) {
                self.store.update_metadata(metadata).await?;
            }
        }

        Ok(true)
    }

    /// Revokes a token known only by the id embedded in its payload, e.g.
    /// the access token referenced from its paired refresh token.
    pub async fn revoke_by_id(&self, token_id: &str, reason: &str) -> DomainResult<bool> {
        match self.store.find_by_token_id(token_id).await? {
            Some(metadata) => self.revoke_hash(&metadata.token_hash, reason, None).await,
            None => Ok(false),
        }
    }

    /// Bulk revocation for logout-everywhere. Returns how many tokens were
    /// newly revoked.
    pub async fn revoke_all_for_subject(
        &self,
        subject: &str,
        reason: &str,
    ) -> DomainResult<usize> {
        let mut count = 0;
        for metadata in self.store.find_by_subject(subject).await? {
            if metadata.is_revoked() {
                continue;
            }
            if self.revoke_hash(&metadata.token_hash, reason, None).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Drops records past natural expiry. Returns purge counts.
    pub async fn purge_expired(&self) -> DomainResult<(usize, usize)> {
        self.store.purge_expired().await
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}
