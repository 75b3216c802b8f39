//! Solana Provider Module
//!
//! JSON-RPC fetch layer for transaction history:
//! 1. Signature listing per address (getSignaturesForAddress)
//! 2. Concurrent per-transaction detail fetches with bounded fan-out
//! 3. Exponential backoff retry with jitter (1s -> 2s -> ... -> 64s)
//! 4. Signature-keyed record cache so repeat analyses never refetch details
//!
//! Individual fetch failures drop that record with a warning instead of
//! aborting the batch; the analyzer always receives a complete list.

use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::Deserialize;
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{InstructionRecord, TransactionRecord};
use crate::utils::constants::{lamports_to_sol, USER_AGENT as USER_AGENT_CONST};

// ============================================
// RETRY CONSTANTS
// ============================================

/// Base retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 1000;

/// Maximum retry delay in milliseconds
pub const MAX_RETRY_MS: u64 = 64_000;

/// Maximum retry attempts (exponential backoff 1s->2s->4s->...->64s)
pub const MAX_RETRIES: u32 = 7;

/// Jitter percentage applied to retry delays to prevent thundering herd
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Record cache is wiped once it grows past this many entries
const RECORD_CACHE_LIMIT: usize = 10_000;

// ============================================
// RAW RPC TYPES
// ============================================

/// Entry from getSignaturesForAddress
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub err: Option<serde_json::Value>,
}

/// Raw transaction as returned by getTransaction with "json" encoding
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub slot: u64,
    pub transaction: RawTransactionData,
    pub meta: Option<RawMeta>,
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionData {
    pub signatures: Vec<String>,
    pub message: RawMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub account_keys: Vec<String>,
    pub instructions: Vec<RawInstruction>,
}

/// Instruction with account indices into the message key list and base58
/// encoded data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeta {
    pub err: Option<serde_json::Value>,
    pub fee: u64,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub log_messages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct BalanceResponse {
    value: u64,
}

// ============================================
// SOLANA RPC CLIENT
// ============================================

/// Solana RPC client with retry logic and a transaction record cache
pub struct SolanaClient {
    rpc_url: String,
    client: reqwest::Client,
    max_concurrent_fetches: usize,
    /// Resolved records keyed by signature; survives across analyses
    record_cache: DashMap<String, TransactionRecord>,
}

impl SolanaClient {
    /// Create a new client from the engine configuration
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.rpc_timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            rpc_url: config.rpc_url.clone(),
            client,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
            record_cache: DashMap::new(),
        })
    }

    /// Execute a JSON-RPC call with exponential backoff and jitter
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let mut last_error: Option<AppError> = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let base_delay = BASE_RETRY_MS * 2_u64.pow(attempt - 1);
                let capped_delay = base_delay.min(MAX_RETRY_MS);
                let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
                let jitter: i64 =
                    rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
                let final_delay = (capped_delay as i64 + jitter).max(100) as u64;

                debug!(
                    "⏳ Retry {}/{} for {} after {}ms",
                    attempt + 1,
                    MAX_RETRIES,
                    method,
                    final_delay
                );
                tokio::time::sleep(Duration::from_millis(final_delay)).await;
            }

            match self.execute_call::<T>(method, &payload).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt + 1 < MAX_RETRIES => {
                    warn!("⚠️ RPC call {} failed (attempt {}): {}", method, attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::rpc_error("retries exhausted")))
    }

    /// Execute a single RPC call
    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> AppResult<T> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::rpc_timeout(method)
                } else {
                    AppError::rpc_connection_failed(e.to_string())
                }
            })?;

        if response.status().as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::rpc_invalid_response(e.to_string()))?;

        if let Some(error) = json.get("error") {
            return Err(AppError::rpc_error(error.to_string()));
        }

        let result = json
            .get("result")
            .ok_or_else(|| AppError::rpc_invalid_response("no result field"))?;

        serde_json::from_value(result.clone())
            .map_err(|e| AppError::rpc_invalid_response(e.to_string()))
    }

    // ============================================
    // STANDARD RPC METHODS
    // ============================================

    /// Signatures touching an address, newest first
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> AppResult<Vec<SignatureInfo>> {
        let params = serde_json::json!([address, {"limit": limit}]);
        self.call("getSignaturesForAddress", params)
            .await
            .map_err(|e| AppError::fetch_signatures_failed(format!("{}: {}", address, e)))
    }

    /// Full transaction detail, None when the node no longer has it
    pub async fn get_transaction(&self, signature: &str) -> AppResult<Option<RawTransaction>> {
        let params = serde_json::json!([
            signature,
            {"encoding": "json", "maxSupportedTransactionVersion": 0}
        ]);
        self.call("getTransaction", params).await
    }

    /// Account balance in SOL
    pub async fn get_balance(&self, address: &str) -> AppResult<f64> {
        let params = serde_json::json!([address]);
        let response: BalanceResponse = self.call("getBalance", params).await?;
        Ok(lamports_to_sol(response.value))
    }

    // ============================================
    // FETCH LAYER
    // ============================================

    /// Fetch the transaction history for an address as analyzable records.
    ///
    /// Signature listing is one call; detail fetches run concurrently with
    /// bounded fan-out and are served from the record cache when possible.
    /// Failed on-chain transactions are skipped, and a record whose detail
    /// fetch fails is dropped rather than failing the whole batch.
    pub async fn fetch_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> AppResult<Vec<TransactionRecord>> {
        let signatures = self.get_signatures_for_address(address, limit).await?;
        if signatures.is_empty() {
            return Err(AppError::no_history(address));
        }

        if self.record_cache.len() > RECORD_CACHE_LIMIT {
            self.record_cache.clear();
        }

        let mut records: Vec<TransactionRecord> = Vec::with_capacity(signatures.len());
        let mut missing: Vec<String> = Vec::new();
        for info in signatures {
            if info.err.is_some() {
                debug!("Skipping failed transaction {}", info.signature);
                continue;
            }
            match self.record_cache.get(&info.signature) {
                Some(cached) => records.push(cached.clone()),
                None => missing.push(info.signature),
            }
        }

        let fetched: Vec<Option<TransactionRecord>> = stream::iter(missing)
            .map(|signature| async move {
                match self.get_transaction(&signature).await {
                    Ok(Some(raw)) => resolve_record(&signature, raw),
                    Ok(None) => {
                        debug!("Transaction {} not available on this node", signature);
                        None
                    }
                    Err(e) => {
                        warn!("⚠️ Dropping transaction {}: {}", signature, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        for record in fetched.into_iter().flatten() {
            self.record_cache
                .insert(record.signature.clone(), record.clone());
            records.push(record);
        }

        // Newest first, undated last, matching the signature listing order
        records.sort_by(|a, b| match (a.block_time, b.block_time) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(records)
    }
}

/// Resolve a raw transaction into an analyzable record: account indices
/// become addresses and base58 instruction data becomes raw bytes.
/// Instructions with out-of-range indices are dropped.
fn resolve_record(signature: &str, raw: RawTransaction) -> Option<TransactionRecord> {
    let accounts = raw.transaction.message.account_keys;
    if accounts.is_empty() {
        return None;
    }

    let instructions: Vec<InstructionRecord> = raw
        .transaction
        .message
        .instructions
        .iter()
        .filter_map(|ix| {
            let program_id = accounts.get(ix.program_id_index as usize)?.clone();
            let resolved: Vec<String> = ix
                .accounts
                .iter()
                .filter_map(|&i| accounts.get(i as usize).cloned())
                .collect();
            let data = bs58::decode(&ix.data).into_vec().unwrap_or_default();
            Some(InstructionRecord {
                program_id,
                accounts: resolved,
                data,
            })
        })
        .collect();

    let (logs, pre_balances, post_balances) = match raw.meta {
        Some(meta) => (meta.log_messages, Some(meta.pre_balances), Some(meta.post_balances)),
        None => (None, None, None),
    };

    Some(TransactionRecord {
        signature: signature.to_string(),
        block_time: raw.block_time,
        accounts,
        instructions,
        logs,
        pre_balances,
        post_balances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_tx(keys: &[&str], instructions: Vec<RawInstruction>) -> RawTransaction {
        RawTransaction {
            slot: 1,
            transaction: RawTransactionData {
                signatures: vec!["sig".to_string()],
                message: RawMessage {
                    account_keys: keys.iter().map(|k| k.to_string()).collect(),
                    instructions,
                },
            },
            meta: Some(RawMeta {
                err: None,
                fee: 5000,
                pre_balances: vec![10, 0],
                post_balances: vec![4, 6],
                log_messages: Some(vec!["Program log: ok".to_string()]),
            }),
            block_time: Some(1_700_000_000),
        }
    }

    #[test]
    fn test_resolve_record_maps_indices_to_addresses() {
        let data = bs58::encode(vec![2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]).into_string();
        let raw = raw_tx(
            &["sender", "recipient", "program"],
            vec![RawInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data,
            }],
        );

        let record = resolve_record("sig", raw).expect("should resolve");
        assert_eq!(record.accounts, vec!["sender", "recipient", "program"]);
        assert_eq!(record.instructions.len(), 1);
        assert_eq!(record.instructions[0].program_id, "program");
        assert_eq!(record.instructions[0].accounts, vec!["sender", "recipient"]);
        assert_eq!(
            record.instructions[0].data,
            vec![2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(record.pre_balances, Some(vec![10, 0]));
        assert_eq!(record.block_time, Some(1_700_000_000));
    }

    #[test]
    fn test_resolve_record_drops_out_of_range_instruction() {
        let raw = raw_tx(
            &["only"],
            vec![RawInstruction {
                program_id_index: 9,
                accounts: vec![0],
                data: String::new(),
            }],
        );
        let record = resolve_record("sig", raw).expect("should resolve");
        assert!(record.instructions.is_empty());
    }

    #[test]
    fn test_resolve_record_rejects_empty_account_list() {
        let raw = raw_tx(&[], vec![]);
        assert!(resolve_record("sig", raw).is_none());
    }

    #[test]
    fn test_undecodable_base58_becomes_empty_data() {
        let raw = raw_tx(
            &["a", "b"],
            vec![RawInstruction {
                program_id_index: 1,
                accounts: vec![0],
                data: "not-base58-0OIl".to_string(),
            }],
        );
        let record = resolve_record("sig", raw).expect("should resolve");
        assert!(record.instructions[0].data.is_empty());
    }
}
