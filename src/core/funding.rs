//! Funding Source Tracer
//! Builds the confidence-scored ledger of addresses that sent value to the
//! target, ordered by total contribution

use crate::core::value::classify_direction;
use crate::models::types::{ClassifiedTransaction, FundingSource};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Confidence assigned to a sender on first observation
const INITIAL_CONFIDENCE: u8 = 60;
/// Confidence gained per repeat observation of the same sender
const REPEAT_CONFIDENCE_STEP: u8 = 5;
const MAX_CONFIDENCE: u8 = 100;

/// Trace funding sources for the target address.
///
/// Transactions are walked in ascending time order with undated records last.
/// Only incoming transactions qualify; the sender is the first non-target
/// account in the account list (multi-party transactions are intentionally
/// attributed to a single sender). The result is sorted descending by
/// cumulative amount.
pub fn trace_funding_sources(
    transactions: &[ClassifiedTransaction],
    target: &str,
) -> Vec<FundingSource> {
    let mut ordered: Vec<&ClassifiedTransaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| match (a.block_time(), b.block_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut sources: Vec<FundingSource> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in ordered {
        if tx.record.accounts.is_empty() {
            continue;
        }
        if !classify_direction(&tx.record, target).is_incoming() {
            continue;
        }
        let sender = match tx.record.first_counterparty(target) {
            Some(address) => address.to_string(),
            None => continue,
        };

        let seen_at = tx.record.block_datetime();
        match index.get(&sender) {
            Some(&i) => {
                let source = &mut sources[i];
                source.total_amount += tx.value;
                source.tx_count += 1;
                source.confidence =
                    (source.confidence + REPEAT_CONFIDENCE_STEP).min(MAX_CONFIDENCE);
                if seen_at.is_some() {
                    source.last_seen = seen_at;
                }
            }
            None => {
                index.insert(sender.clone(), sources.len());
                sources.push(FundingSource {
                    address: sender,
                    first_seen_signature: tx.signature().to_string(),
                    first_seen: seen_at,
                    last_seen: seen_at,
                    total_amount: tx.value,
                    tx_count: 1,
                    confidence: INITIAL_CONFIDENCE,
                });
            }
        }
    }

    sources.sort_by(|a, b| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(Ordering::Equal)
    });
    sources
}
