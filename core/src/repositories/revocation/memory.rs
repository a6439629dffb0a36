//! In-memory revocation store for single-instance deployments.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::metadata::TokenMetadata;
use crate::errors::{DomainError, DomainResult};

use super::r#trait::RevocationStore;

/// Default blacklist capacity before FIFO eviction kicks in
pub const DEFAULT_MAX_BLACKLIST_SIZE: usize = 10_000;

struct MetadataTable {
    by_hash: HashMap<String, TokenMetadata>,
    // Secondary index so revoke-by-id avoids a linear scan
    hash_by_id: HashMap<String, String>,
}

struct Blacklist {
    entries: HashMap<String, DateTime<Utc>>,
    // Insertion order for capacity eviction
    order: VecDeque<String>,
}

/// Process-local revocation store backed by rw-locked maps.
///
/// Capacity policy: once the blacklist exceeds its maximum size, the oldest
/// inserted entry whose token has already expired is evicted; if none has,
/// the oldest entry overall goes. This bounds memory at the cost of a small
/// false-negative risk for revocations far past natural token expiry.
pub struct MemoryRevocationStore {
    metadata: RwLock<MetadataTable>,
    blacklist: RwLock<Blacklist>,
    max_blacklist_size: usize,
}

impl MemoryRevocationStore {
    pub fn new(max_blacklist_size: usize) -> Self {
        // Capacity floor of one entry; at zero no insert could ever satisfy
        // the eviction loop.
        let max_blacklist_size = max_blacklist_size.max(1);
        Self {
            metadata: RwLock::new(MetadataTable {
                by_hash: HashMap::new(),
                hash_by_id: HashMap::new(),
            }),
            blacklist: RwLock::new(Blacklist {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_blacklist_size,
        }
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLACKLIST_SIZE)
    }
}

impl Blacklist {
    /// Removes one entry, preferring one whose token already expired
    /// naturally. Returns `false` when there was nothing to evict.
    fn evict_one(&mut self) -> bool {
        let now = Utc::now();

        let expired_pos = self
            .order
            .iter()
            .position(|hash| matches!(self.entries.get(hash), Some(exp) if *exp <= now));

        let victim = match expired_pos {
            Some(pos) => self.order.remove(pos),
            None => self.order.pop_front(),
        };

        match victim {
            Some(hash) => {
                self.entries.remove(&hash);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn save_metadata(&self, metadata: TokenMetadata) -> DomainResult<()> {
        let mut table = self.metadata.write().await;

        if table.by_hash.contains_key(&metadata.token_hash) {
            return Err(DomainError::Validation {
                message: "token hash already registered".to_string(),
            });
        }
        if table.hash_by_id.contains_key(&metadata.token_id) {
            return Err(DomainError::Validation {
                message: "token id already registered".to_string(),
            });
        }

        table
            .hash_by_id
            .insert(metadata.token_id.clone(), metadata.token_hash.clone());
        table.by_hash.insert(metadata.token_hash.clone(), metadata);
        Ok(())
    }

    async fn find_metadata(&self, token_hash: &str) -> DomainResult<Option<TokenMetadata>> {
        let table = self.metadata.read().await;
        Ok(table.by_hash.get(token_hash).cloned())
    }

    async fn find_by_token_id(&self, token_id: &str) -> DomainResult<Option<TokenMetadata>> {
        let table = self.metadata.read().await;
        Ok(table
            .hash_by_id
            .get(token_id)
            .and_then(|hash| table.by_hash.get(hash))
            .cloned())
    }

    async fn update_metadata(&self, metadata: TokenMetadata) -> DomainResult<bool> {
        let mut table = self.metadata.write().await;
        match table.by_hash.get_mut(&metadata.token_hash) {
            Some(existing) => {
                *existing = metadata;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_subject(&self, subject: &str) -> DomainResult<Vec<TokenMetadata>> {
        let table = self.metadata.read().await;
        Ok(table
            .by_hash
            .values()
            .filter(|m| m.subject == subject)
            .cloned()
            .collect())
    }

    async fn insert_blacklist(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut blacklist = self.blacklist.write().await;

        if blacklist.entries.contains_key(token_hash) {
            return Ok(());
        }

        while blacklist.entries.len() >= self.max_blacklist_size {
            if !blacklist.evict_one() {
                break;
            }
        }

        blacklist.entries.insert(token_hash.to_string(), expires_at);
        blacklist.order.push_back(token_hash.to_string());
        Ok(())
    }

    async fn is_blacklisted(&self, token_hash: &str) -> DomainResult<bool> {
        let blacklist = self.blacklist.read().await;
        Ok(blacklist.entries.contains_key(token_hash))
    }

    async fn blacklist_len(&self) -> DomainResult<usize> {
        let blacklist = self.blacklist.read().await;
        Ok(blacklist.entries.len())
    }

    async fn purge_expired(&self) -> DomainResult<(usize, usize)> {
        let now = Utc::now();

        let metadata_purged = {
            let mut table = self.metadata.write().await;
            let before = table.by_hash.len();
            let expired: Vec<String> = table
                .by_hash
                .values()
                .filter(|m| m.expires_at <= now)
                .map(|m| m.token_hash.clone())
                .collect();
            for hash in &expired {
                if let Some(meta) = table.by_hash.remove(hash) {
                    table.hash_by_id.remove(&meta.token_id);
                }
            }
            before - table.by_hash.len()
        };

        let blacklist_purged = {
            let mut guard = self.blacklist.write().await;
            let blacklist = &mut *guard;
            let before = blacklist.entries.len();
            blacklist.entries.retain(|_, exp| *exp > now);
            let entries = &blacklist.entries;
            blacklist.order.retain(|hash| entries.contains_key(hash));
            before - blacklist.entries.len()
        };

        Ok((metadata_purged, blacklist_purged))
    }
}
