//! Background maintenance: purging expired records and scheduled key
//! rotation.

use std::sync::Arc;
use std::time::Duration;

use td_shared::config::Environment;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::repositories::revocation::RevocationStore;

use super::key_store::SigningKeyStore;
use super::registry::RevocationRegistry;

/// Scheduling knobs for the maintenance loops
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Seconds between purge runs
    pub cleanup_interval_seconds: u64,
    /// Seconds between signing key rotations. With `max_active_keys` keys
    /// retained, `rotation_interval * (max_active_keys - 1)` must cover the
    /// refresh token lifetime, or rotation strands outstanding tokens
    /// through count-based eviction before they expire.
    pub rotation_interval_seconds: u64,
    /// Master switch for the background loops
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: 3600,
            // 15 days: two retained predecessors span the 30-day refresh
            // lifetime at the default max_active_keys of 3
            rotation_interval_seconds: 15 * 86_400,
            enabled: true,
        }
    }
}

impl MaintenanceConfig {
    /// Builds a config from environment variables, falling back to defaults.
    /// Background loops stay off in development unless forced on.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.enabled = !Environment::from_env().is_development();

        if let Some(seconds) = env_u64("TD_CLEANUP_INTERVAL_SECONDS") {
            config.cleanup_interval_seconds = seconds;
        }
        if let Some(seconds) = env_u64("TD_ROTATION_INTERVAL_SECONDS") {
            config.rotation_interval_seconds = seconds;
        }
        if let Ok(enabled) = std::env::var("TD_MAINTENANCE_ENABLED") {
            config.enabled = enabled != "false" && enabled != "0";
        }

        config
    }
}

fn env_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok()?.parse().ok()
}

/// Outcome of one cleanup run
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    /// Expired metadata records dropped
    pub metadata_purged: usize,
    /// Expired blacklist entries dropped
    pub blacklist_purged: usize,
    /// Errors encountered; the run keeps going past them
    pub errors: Vec<String>,
}

impl MaintenanceReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_cleaned(&self) -> usize {
        self.metadata_purged + self.blacklist_purged
    }
}

/// Periodic maintenance over the revocation store and key ring.
///
/// Purging is an optimization, not a correctness requirement: expired
/// records fail validation on their own, cleanup just bounds memory.
pub struct TokenMaintenanceService<S> {
    registry: RevocationRegistry<S>,
    key_store: Arc<SigningKeyStore>,
    config: MaintenanceConfig,
}

impl<S: RevocationStore + 'static> TokenMaintenanceService<S> {
    pub fn new(
        registry: RevocationRegistry<S>,
        key_store: Arc<SigningKeyStore>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            registry,
            key_store,
            config,
        }
    }

    /// Runs one purge pass and reports what it cleaned.
    pub async fn run_cleanup(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.registry.purge_expired().await {
            Ok((metadata, blacklist)) => {
                report.metadata_purged = metadata;
                report.blacklist_purged = blacklist;
            }
            Err(e) => {
                report.errors.push(format!("purge failed: {e}"));
            }
        }

        if report.is_success() {
            info!(
                metadata = report.metadata_purged,
                blacklist = report.blacklist_purged,
                "token cleanup completed"
            );
        } else {
            error!(errors = ?report.errors, "token cleanup finished with errors");
        }

        report
    }

    /// Spawns the cleanup and rotation loops. Rotation is skipped entirely
    /// for key stores with a static key pair.
    pub fn start_background_tasks(self: &Arc<Self>) {
        if !self.config.enabled {
            info!("token maintenance disabled");
            return;
        }

        let cleanup = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker =
                interval(Duration::from_secs(cleanup.config.cleanup_interval_seconds));
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cleanup.run_cleanup().await;
            }
        });
        info!(
            interval_seconds = self.config.cleanup_interval_seconds,
            "token cleanup task started"
        );

        if self.key_store.supports_rotation() {
            let rotation = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(
                    rotation.config.rotation_interval_seconds,
                ));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    match rotation.key_store.rotate() {
                        Ok(key) => {
                            info!(kid = %key.key_id, "scheduled signing key rotation")
                        }
                        Err(e) => warn!(error = %e, "scheduled key rotation failed"),
                    }
                }
            });
            info!(
                interval_seconds = self.config.rotation_interval_seconds,
                "key rotation task started"
            );
        }
    }
}
