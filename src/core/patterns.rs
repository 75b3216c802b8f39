//! Activity Pattern Detector
//! Five independent sub-detectors (temporal, value repetition, frequent
//! counterparty, fund dispersion, circular movement) over the classified
//! transaction list. Outputs are concatenated, never re-ranked.

use crate::config::DetectorConfig;
use crate::core::value::{classify_direction, Direction};
use crate::models::types::{ActivityPattern, ClassifiedTransaction, PatternKind};
use chrono::{DateTime, Timelike, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

const TEMPORAL_RISK: u8 = 20;
const TEMPORAL_CONFIDENCE: u8 = 70;
const VALUE_RISK: u8 = 20;
const VALUE_RISK_LARGE: u8 = 40;
const VALUE_CONFIDENCE: u8 = 75;
const COUNTERPARTY_RISK: u8 = 30;
const COUNTERPARTY_CONFIDENCE: u8 = 80;
const DISPERSION_RISK: u8 = 70;
const DISPERSION_CONFIDENCE: u8 = 85;
const CIRCULAR_RISK: u8 = 60;
const CIRCULAR_CONFIDENCE: u8 = 75;

/// Example signatures carried per pattern; dispersion keeps every consumed
/// signature instead
const MAX_EVIDENCE: usize = 5;

pub const TEMPORAL_PATTERN_NAME: &str = "Temporal Activity Pattern";
pub const VALUE_PATTERN_NAME: &str = "Value Repetition Pattern";
pub const COUNTERPARTY_PATTERN_NAME: &str = "Frequent Counterparty Pattern";
pub const DISPERSION_PATTERN_NAME: &str = "Fund Dispersion Pattern";
pub const CIRCULAR_PATTERN_NAME: &str = "Circular Movement Pattern";

/// Runs the sub-detectors with a shared threshold configuration.
/// Every detection is a pure function of (transactions, target).
pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Run all sub-detectors and concatenate their findings in fixed order
    pub fn detect_all(
        &self,
        transactions: &[ClassifiedTransaction],
        target: &str,
    ) -> Vec<ActivityPattern> {
        let ordered = time_ordered(transactions);

        let mut patterns = Vec::new();
        if let Some(pattern) = self.detect_temporal(&ordered) {
            patterns.push(pattern);
        }
        patterns.extend(self.detect_value_repetition(&ordered));
        patterns.extend(self.detect_frequent_counterparties(&ordered, target));
        if let Some(pattern) = self.detect_fund_dispersion(&ordered, target) {
            patterns.push(pattern);
        }
        if let Some(pattern) = self.detect_circular_movement(&ordered, target) {
            patterns.push(pattern);
        }
        patterns
    }

    /// Hour-of-day clustering. Needs a minimum timestamped sample; fires when
    /// the modal hour holds both the configured share and an absolute floor
    /// of transactions. Ties resolve to the lowest hour.
    fn detect_temporal(&self, ordered: &[&ClassifiedTransaction]) -> Option<ActivityPattern> {
        let timestamped: Vec<&ClassifiedTransaction> = ordered
            .iter()
            .copied()
            .filter(|tx| tx.block_time().is_some())
            .collect();
        if timestamped.len() < self.config.min_temporal_sample {
            return None;
        }

        let mut by_hour = [0usize; 24];
        for tx in &timestamped {
            if let Some(dt) = tx.record.block_datetime() {
                by_hour[dt.hour() as usize] += 1;
            }
        }

        let mut modal_hour = 0usize;
        let mut modal_count = 0usize;
        for (hour, &count) in by_hour.iter().enumerate() {
            if count > modal_count {
                modal_hour = hour;
                modal_count = count;
            }
        }

        let share_met = modal_count * 100 >= timestamped.len() * self.config.temporal_share_pct;
        if !share_met || modal_count < self.config.min_temporal_hits {
            return None;
        }

        let matching: Vec<&ClassifiedTransaction> = timestamped
            .iter()
            .copied()
            .filter(|tx| {
                tx.record
                    .block_datetime()
                    .map(|dt| dt.hour() as usize == modal_hour)
                    .unwrap_or(false)
            })
            .collect();
        let (first_seen, last_seen) = time_bounds(&matching);

        Some(ActivityPattern {
            kind: PatternKind::Temporal {
                hour: modal_hour as u32,
            },
            name: TEMPORAL_PATTERN_NAME.to_string(),
            description: format!(
                "{} of {} transactions occur around {:02}:00 UTC",
                modal_count,
                timestamped.len(),
                modal_hour
            ),
            frequency: modal_count as u32,
            risk: TEMPORAL_RISK,
            confidence: TEMPORAL_CONFIDENCE,
            evidence: signatures(&matching, MAX_EVIDENCE),
            first_seen,
            last_seen,
        })
    }

    /// Repeated transaction values, bucketed at 3-decimal precision.
    /// Zero-value transactions never form a bucket.
    fn detect_value_repetition(&self, ordered: &[&ClassifiedTransaction]) -> Vec<ActivityPattern> {
        let mut buckets: Vec<(i64, Vec<&ClassifiedTransaction>)> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for tx in ordered.iter().copied() {
            let key = (tx.value * 1000.0).round() as i64;
            if key == 0 {
                continue;
            }
            match index.get(&key) {
                Some(&i) => buckets[i].1.push(tx),
                None => {
                    index.insert(key, buckets.len());
                    buckets.push((key, vec![tx]));
                }
            }
        }

        buckets
            .into_iter()
            .filter(|(_, txs)| txs.len() >= self.config.min_value_repeats)
            .map(|(key, txs)| {
                let value = key as f64 / 1000.0;
                let risk = if txs.len() > self.config.large_value_bucket {
                    VALUE_RISK_LARGE
                } else {
                    VALUE_RISK
                };
                let (first_seen, last_seen) = time_bounds(&txs);
                ActivityPattern {
                    kind: PatternKind::Value { value },
                    name: VALUE_PATTERN_NAME.to_string(),
                    description: format!(
                        "{} transactions move the same amount ({} SOL)",
                        txs.len(),
                        value
                    ),
                    frequency: txs.len() as u32,
                    risk,
                    confidence: VALUE_CONFIDENCE,
                    evidence: signatures(&txs, MAX_EVIDENCE),
                    first_seen,
                    last_seen,
                }
            })
            .collect()
    }

    /// Counterparties that dominate the history, using the same single-sender
    /// attribution as the funding tracer
    fn detect_frequent_counterparties(
        &self,
        ordered: &[&ClassifiedTransaction],
        target: &str,
    ) -> Vec<ActivityPattern> {
        let mut buckets: Vec<(String, Vec<&ClassifiedTransaction>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for tx in ordered.iter().copied() {
            let counterparty = match tx.record.first_counterparty(target) {
                Some(address) => address.to_string(),
                None => continue,
            };
            match index.get(&counterparty) {
                Some(&i) => buckets[i].1.push(tx),
                None => {
                    index.insert(counterparty.clone(), buckets.len());
                    buckets.push((counterparty, vec![tx]));
                }
            }
        }

        buckets
            .into_iter()
            .filter(|(_, txs)| txs.len() >= self.config.min_counterparty_txs)
            .map(|(address, txs)| {
                let (first_seen, last_seen) = time_bounds(&txs);
                ActivityPattern {
                    description: format!(
                        "{} transactions share the counterparty {}",
                        txs.len(),
                        address
                    ),
                    kind: PatternKind::Endpoint { address },
                    name: COUNTERPARTY_PATTERN_NAME.to_string(),
                    frequency: txs.len() as u32,
                    risk: COUNTERPARTY_RISK,
                    confidence: COUNTERPARTY_CONFIDENCE,
                    evidence: signatures(&txs, MAX_EVIDENCE),
                    first_seen,
                    last_seen,
                }
            })
            .collect()
    }

    /// Receive-then-disperse bursts: an incoming transaction followed inside
    /// the window by enough outgoing ones. The scan index jumps past consumed
    /// dispersals so no outgoing transaction backs two instances.
    fn detect_fund_dispersion(
        &self,
        ordered: &[&ClassifiedTransaction],
        target: &str,
    ) -> Option<ActivityPattern> {
        let timed: Vec<(&ClassifiedTransaction, i64, Direction)> = ordered
            .iter()
            .copied()
            .filter_map(|tx| {
                tx.block_time()
                    .map(|t| (tx, t, classify_direction(&tx.record, target)))
            })
            .collect();

        let mut instances = 0usize;
        let mut consumed: Vec<&ClassifiedTransaction> = Vec::new();
        let mut i = 0usize;
        while i < timed.len() {
            let (anchor, anchor_time, direction) = timed[i];
            if !direction.is_incoming() {
                i += 1;
                continue;
            }

            let mut outgoing: Vec<usize> = Vec::new();
            let mut j = i + 1;
            while j < timed.len() && timed[j].1 - anchor_time <= self.config.dispersion_window_secs
            {
                if timed[j].2.is_outgoing() {
                    outgoing.push(j);
                }
                j += 1;
            }

            if outgoing.len() >= self.config.min_dispersion_outgoing {
                instances += 1;
                consumed.push(anchor);
                for &k in &outgoing {
                    consumed.push(timed[k].0);
                }
                i = outgoing.last().copied().unwrap_or(i) + 1;
            } else {
                i += 1;
            }
        }

        if instances < self.config.min_dispersion_instances {
            return None;
        }

        let (first_seen, last_seen) = time_bounds(&consumed);
        Some(ActivityPattern {
            kind: PatternKind::Behavioral { address: None },
            name: DISPERSION_PATTERN_NAME.to_string(),
            description: format!(
                "{} receive-then-disperse bursts within {}s of an incoming transfer",
                instances, self.config.dispersion_window_secs
            ),
            frequency: instances as u32,
            risk: DISPERSION_RISK,
            confidence: DISPERSION_CONFIDENCE,
            evidence: signatures(&consumed, usize::MAX),
            first_seen,
            last_seen,
        })
    }

    /// Addresses that both send to and receive from the target. Enough such
    /// candidates emit one pattern keyed on the busiest of them, earliest
    /// seen winning ties.
    fn detect_circular_movement(
        &self,
        ordered: &[&ClassifiedTransaction],
        target: &str,
    ) -> Option<ActivityPattern> {
        struct Candidate<'a> {
            address: String,
            txs: Vec<&'a ClassifiedTransaction>,
            incoming: bool,
            outgoing: bool,
        }

        let mut entries: Vec<Candidate> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for tx in ordered.iter().copied() {
            let direction = classify_direction(&tx.record, target);
            if direction == Direction::Indeterminate {
                continue;
            }
            let mut seen_in_tx: Vec<&str> = Vec::new();
            for account in &tx.record.accounts {
                if account == target || seen_in_tx.contains(&account.as_str()) {
                    continue;
                }
                seen_in_tx.push(account);

                let i = match index.get(account.as_str()) {
                    Some(&i) => i,
                    None => {
                        index.insert(account.clone(), entries.len());
                        entries.push(Candidate {
                            address: account.clone(),
                            txs: Vec::new(),
                            incoming: false,
                            outgoing: false,
                        });
                        entries.len() - 1
                    }
                };
                let entry = &mut entries[i];
                entry.txs.push(tx);
                entry.incoming |= direction.is_incoming();
                entry.outgoing |= direction.is_outgoing();
            }
        }

        let candidates: Vec<&Candidate> = entries
            .iter()
            .filter(|e| {
                e.txs.len() >= self.config.min_circular_appearances && e.incoming && e.outgoing
            })
            .collect();
        if candidates.len() < self.config.min_circular_candidates {
            return None;
        }

        let (first, rest) = candidates.split_first()?;
        let mut keyed: &Candidate = first;
        for candidate in rest {
            if candidate.txs.len() > keyed.txs.len() {
                keyed = candidate;
            }
        }

        let (first_seen, last_seen) = time_bounds(&keyed.txs);
        Some(ActivityPattern {
            kind: PatternKind::Behavioral {
                address: Some(keyed.address.clone()),
            },
            name: CIRCULAR_PATTERN_NAME.to_string(),
            description: format!(
                "{} addresses both send and receive; {} is the busiest with {} transactions",
                candidates.len(),
                keyed.address,
                keyed.txs.len()
            ),
            frequency: keyed.txs.len() as u32,
            risk: CIRCULAR_RISK,
            confidence: CIRCULAR_CONFIDENCE,
            evidence: signatures(&keyed.txs, MAX_EVIDENCE),
            first_seen,
            last_seen,
        })
    }
}

/// Ascending block time, undated records last. Stable, so equal keys keep
/// input order.
fn time_ordered(transactions: &[ClassifiedTransaction]) -> Vec<&ClassifiedTransaction> {
    let mut ordered: Vec<&ClassifiedTransaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| match (a.block_time(), b.block_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

fn signatures(txs: &[&ClassifiedTransaction], cap: usize) -> Vec<String> {
    txs.iter()
        .take(cap)
        .map(|tx| tx.signature().to_string())
        .collect()
}

fn time_bounds(
    txs: &[&ClassifiedTransaction],
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let times: Vec<DateTime<Utc>> = txs
        .iter()
        .filter_map(|tx| tx.record.block_datetime())
        .collect();
    (times.iter().min().copied(), times.iter().max().copied())
}
