//! In-Memory Analysis Cache Module
//!
//! Thread-safe caching layer for finished analysis results, keyed by
//! "address:limit". DashMap keeps concurrent handlers off each other's
//! locks; entries expire by TTL and a periodic sweep removes stale ones.
//!
//! Base58 addresses are case-sensitive, so keys are never normalized.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::types::AnalysisResult;

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub result: AnalysisResult,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Remaining seconds before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl
            .saturating_sub(self.created_at.elapsed())
            .as_secs()
    }
}

/// Shared analysis cache
#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cache key for an analysis request
    pub fn key(address: &str, limit: usize) -> String {
        format!("{}:{}", address, limit)
    }

    /// Get a cached result, treating expired entries as misses
    pub fn get(&self, key: &str) -> Option<AnalysisResult> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.store.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
                Some(entry.result.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            None
        }
    }

    pub fn set(&self, key: &str, result: AnalysisResult) {
        let entry = CacheEntry {
            result,
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        self.store.insert(key.to_string(), entry);
        info!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
    }

    /// Drop a cached result ahead of its TTL
    #[allow(dead_code)]
    pub fn invalidate(&self, key: &str) {
        self.store.remove(key);
        debug!("🗑️ CACHE INVALIDATE: {}", key);
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before - self.store.len();
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
