//! Configuration module for FlowScope
//! Environment-backed runtime settings plus the detector thresholds

use crate::utils::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_LIMIT, DEFAULT_MAX_CONCURRENT_FETCHES,
    DEFAULT_RPC_TIMEOUT_SECS,
};
use std::time::Duration;

/// Runtime configuration for the fetch layer and service surfaces
pub struct EngineConfig {
    /// HTTP JSON-RPC endpoint for transaction history
    pub rpc_url: String,

    /// Timeout for individual RPC calls
    pub rpc_timeout: Duration,

    /// Maximum signatures fetched per analyzed address
    pub fetch_limit: usize,

    /// Maximum concurrent per-transaction detail fetches
    pub max_concurrent_fetches: usize,

    /// How long finished analyses stay cached
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_url: std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            rpc_timeout: Duration::from_secs(
                env_number("RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS),
            ),
            fetch_limit: env_number("FETCH_LIMIT", DEFAULT_FETCH_LIMIT),
            max_concurrent_fetches: env_number(
                "MAX_CONCURRENT_FETCHES",
                DEFAULT_MAX_CONCURRENT_FETCHES,
            ),
            cache_ttl: Duration::from_secs(env_number("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Thresholds for the activity pattern sub-detectors
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum timestamped transactions before temporal analysis runs
    pub min_temporal_sample: usize,

    /// Share of transactions (percent) the modal hour must hold
    pub temporal_share_pct: usize,

    /// Absolute transaction floor for the modal hour
    pub min_temporal_hits: usize,

    /// Bucket size at which a repeated value becomes a pattern
    pub min_value_repeats: usize,

    /// Bucket size above which value repetition is scored as higher risk
    pub large_value_bucket: usize,

    /// Transaction count at which a counterparty becomes a pattern
    pub min_counterparty_txs: usize,

    /// Window after an incoming transaction in which outgoing bursts count
    pub dispersion_window_secs: i64,

    /// Outgoing transactions inside the window needed per dispersion instance
    pub min_dispersion_outgoing: usize,

    /// Receive-then-disperse instances needed to emit the pattern
    pub min_dispersion_instances: usize,

    /// Transactions an address must appear in to be a circular candidate
    pub min_circular_appearances: usize,

    /// Circular candidates needed to emit the pattern
    pub min_circular_candidates: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_temporal_sample: 5,
            temporal_share_pct: 30, // modal hour must hold 30% of activity
            min_temporal_hits: 3,
            min_value_repeats: 3,
            large_value_bucket: 10,
            min_counterparty_txs: 5,
            dispersion_window_secs: 3600, // one hour
            min_dispersion_outgoing: 3,
            min_dispersion_instances: 2,
            min_circular_appearances: 2,
            min_circular_candidates: 2,
        }
    }
}
