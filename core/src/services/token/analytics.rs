//! Observability counters for the token engine.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time counter snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub issued: u64,
    pub validated: u64,
    pub validation_failures: u64,
    pub revoked: u64,
    pub expired: u64,
    pub rotated: u64,
    pub suspicious_flags: u64,
}

/// Lock-free rollup of lifecycle events. Read-only observer: nothing in the
/// token pipeline consults these counters.
#[derive(Debug, Default)]
pub struct TokenAnalytics {
    issued: AtomicU64,
    validated: AtomicU64,
    validation_failures: AtomicU64,
    revoked: AtomicU64,
    expired: AtomicU64,
    rotated: AtomicU64,
    suspicious_flags: AtomicU64,
}

impl TokenAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validated(&self) {
        self.validated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revoked(&self) {
        self.revoked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotated(&self) {
        self.rotated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suspicious_flag(&self) {
        self.suspicious_flags.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough snapshot for dashboards and logs
    pub fn snapshot(&self) -> TokenStats {
        TokenStats {
            issued: self.issued.load(Ordering::Relaxed),
            validated: self.validated.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            revoked: self.revoked.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            rotated: self.rotated.load(Ordering::Relaxed),
            suspicious_flags: self.suspicious_flags.load(Ordering::Relaxed),
        }
    }
}
