//! Value Estimator & Direction Classifier
//! Deterministic replacements for amount and flow-direction estimation,
//! derived from decoded instruction data with a balance-delta fallback

use crate::models::types::TransactionRecord;
use crate::utils::constants::lamports_to_sol;
use crate::utils::decoder::TransferDecoder;

/// Flow direction of a transaction relative to the target address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    /// Neither decoded transfers nor balance deltas say anything about the
    /// target; excluded from direction-dependent detectors
    Indeterminate,
}

impl Direction {
    pub fn is_incoming(&self) -> bool {
        matches!(self, Direction::Incoming)
    }

    pub fn is_outgoing(&self) -> bool {
        matches!(self, Direction::Outgoing)
    }
}

/// Pluggable magnitude estimation. Implementations must be deterministic:
/// the same transaction always yields the same value.
pub trait ValueEstimator: Send + Sync {
    /// Estimated value moved by the transaction, in SOL, never negative
    fn estimate_value(&self, tx: &TransactionRecord) -> f64;
}

/// Default estimator: sums decoded transfer amounts, falling back to the sum
/// of positive balance deltas when no known transfer layout is present.
/// Transactions with neither estimate to 0.
pub struct InstructionValueEstimator;

impl ValueEstimator for InstructionValueEstimator {
    fn estimate_value(&self, tx: &TransactionRecord) -> f64 {
        let decoded: f64 = TransferDecoder::decode_transfers(tx)
            .iter()
            .map(|t| t.amount)
            .sum();
        if decoded > 0.0 {
            return decoded;
        }

        credited_balance_delta(tx).unwrap_or(0.0)
    }
}

/// Sum of positive per-account balance deltas (total value credited), in SOL
fn credited_balance_delta(tx: &TransactionRecord) -> Option<f64> {
    let pre = tx.pre_balances.as_ref()?;
    let post = tx.post_balances.as_ref()?;

    let credited: u64 = pre
        .iter()
        .zip(post.iter())
        .filter(|(before, after)| after > before)
        .map(|(before, after)| after - before)
        .sum();

    Some(lamports_to_sol(credited))
}

/// Classify a transaction as incoming or outgoing relative to the target.
/// Decoded transfers are authoritative: the signed sum of amounts where the
/// target is destination (+) or source (-) decides. When no decoded transfer
/// settles it, the target's own balance delta decides. Anything else is
/// indeterminate.
pub fn classify_direction(tx: &TransactionRecord, target: &str) -> Direction {
    let mut net = 0.0f64;
    let mut touched = false;
    for transfer in TransferDecoder::decode_transfers(tx) {
        if transfer.destination == target {
            net += transfer.amount;
            touched = true;
        }
        if transfer.source == target {
            net -= transfer.amount;
            touched = true;
        }
    }
    if touched && net != 0.0 {
        return if net > 0.0 {
            Direction::Incoming
        } else {
            Direction::Outgoing
        };
    }

    target_balance_direction(tx, target).unwrap_or(Direction::Indeterminate)
}

/// Direction from the target's pre/post balance delta, when both are known
fn target_balance_direction(tx: &TransactionRecord, target: &str) -> Option<Direction> {
    let index = tx.accounts.iter().position(|a| a == target)?;
    let before = *tx.pre_balances.as_ref()?.get(index)? as i128;
    let after = *tx.post_balances.as_ref()?.get(index)? as i128;

    match after - before {
        delta if delta > 0 => Some(Direction::Incoming),
        delta if delta < 0 => Some(Direction::Outgoing),
        _ => None,
    }
}
