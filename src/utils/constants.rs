//! Constants Module - Single Source of Truth
//!
//! All program identifiers, category sets, conversion helpers and shared
//! application constants live here. No hardcoded addresses in other modules.

use lazy_static::lazy_static;
use std::collections::HashSet;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "FlowScope";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "FlowScope/0.1.0";

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default cache TTL for analysis results (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of signatures fetched per analysis
pub const DEFAULT_FETCH_LIMIT: usize = 200;

/// Default bound on concurrent transaction-detail fetches
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Hard ceiling on signatures per fetch (getSignaturesForAddress caps at 1000)
pub const MAX_FETCH_LIMIT: usize = 1000;

// Note: Retry constants live in src/providers/solana.rs next to the retry loop.

// ============================================
// NATIVE UNITS
// ============================================

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert lamports to SOL
#[inline]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert a raw token amount to a UI amount given its decimals
#[inline]
pub fn token_amount_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

// ============================================
// ADDRESS VALIDATION
// ============================================

/// Check that an address is base58 and decodes to a 32-byte public key
pub fn is_valid_address(address: &str) -> bool {
    match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}

// ============================================
// CORE PROGRAM IDS - Single Source of Truth
// ============================================

/// System Program ID (native transfers)
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

/// Stake Program ID
pub const STAKE_PROGRAM: &str = "Stake11111111111111111111111111111111111111";

/// Token Program ID
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Token-2022 Program ID
pub const TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Associated Token Program ID
pub const ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

// ============================================
// DEX PROGRAM IDS
// ============================================

/// Raydium AMM Program ID
pub const RAYDIUM_AMM_PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

/// Raydium CLMM Program ID
pub const RAYDIUM_CLMM_PROGRAM: &str = "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK";

/// Orca Whirlpool Program ID
pub const ORCA_WHIRLPOOL_PROGRAM: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";

/// Jupiter Aggregator Program ID
pub const JUPITER_PROGRAM: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

// ============================================
// NFT MARKETPLACE PROGRAM IDS
// ============================================

/// Magic Eden v2 Program ID
pub const MAGIC_EDEN_V2_PROGRAM: &str = "M2mx93ekt1fmXSVkTrUL9xVFHkmME8HTUi5Cyc5aF7K";

/// Tensor Swap Program ID
pub const TENSOR_SWAP_PROGRAM: &str = "TSWAPaqyCSx2KABk68Shruf4rp7CxcNi8hAsbdwmHbN";

// ============================================
// CLASSIFIER CATEGORY SETS
// ============================================

lazy_static! {
    /// NFT marketplace programs (highest classification priority)
    pub static ref NFT_PROGRAMS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(MAGIC_EDEN_V2_PROGRAM);
        set.insert(TENSOR_SWAP_PROGRAM);
        set
    };

    /// Swap / DEX programs
    pub static ref SWAP_PROGRAMS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(RAYDIUM_AMM_PROGRAM);
        set.insert(RAYDIUM_CLMM_PROGRAM);
        set.insert(ORCA_WHIRLPOOL_PROGRAM);
        set.insert(JUPITER_PROGRAM);
        set
    };

    /// Fungible token programs
    pub static ref TOKEN_PROGRAMS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(TOKEN_PROGRAM);
        set.insert(TOKEN_2022_PROGRAM);
        set
    };
}

/// Well-known program labels for entity identification
pub fn known_program_label(program_id: &str) -> Option<&'static str> {
    match program_id {
        SYSTEM_PROGRAM => Some("System Program"),
        STAKE_PROGRAM => Some("Stake Program"),
        TOKEN_PROGRAM => Some("SPL Token Program"),
        TOKEN_2022_PROGRAM => Some("Token-2022 Program"),
        ASSOCIATED_TOKEN_PROGRAM => Some("Associated Token Program"),
        RAYDIUM_AMM_PROGRAM => Some("Raydium AMM"),
        RAYDIUM_CLMM_PROGRAM => Some("Raydium CLMM"),
        ORCA_WHIRLPOOL_PROGRAM => Some("Orca Whirlpool"),
        JUPITER_PROGRAM => Some("Jupiter Aggregator"),
        MAGIC_EDEN_V2_PROGRAM => Some("Magic Eden v2"),
        TENSOR_SWAP_PROGRAM => Some("Tensor Swap"),
        _ => None,
    }
}

// ============================================
// ANALYSIS THRESHOLDS
// ============================================

/// Cumulative amount (SOL) above which a funding source counts as high-value
pub const HIGH_VALUE_SOURCE_THRESHOLD: f64 = 50.0;

/// Maximum addresses accepted by a single batch API request
pub const MAX_BATCH_ADDRESSES: usize = 25;
