//! Critical Path Identifier
//! Cross-references funding sources, detected patterns, and the externally
//! supplied unusual-transaction set into human-readable risk narratives

use crate::core::patterns::DISPERSION_PATTERN_NAME;
use crate::models::types::{ActivityPattern, ClassifiedTransaction, CriticalPath, FundingSource};
use crate::utils::constants::HIGH_VALUE_SOURCE_THRESHOLD;

const HIGH_VALUE_WEIGHT: u8 = 30;
const UNUSUAL_WEIGHT: u8 = 70;
const MIXING_WEIGHT: u8 = 80;

/// At most this many funding sources back the high-value entry
const MAX_HIGH_VALUE_SOURCES: usize = 3;
/// At most this many unusual signatures are carried as evidence
const MAX_UNUSUAL_EVIDENCE: usize = 10;
/// Dispersion patterns at or below this risk are not treated as mixing
const MIXING_RISK_FLOOR: u8 = 60;

/// Identify critical paths. Three independent rules, each optional, emitted
/// in rule order. No sorting by weight; ranking is the caller's concern.
pub fn identify_critical_paths(
    transactions: &[ClassifiedTransaction],
    funding_sources: &[FundingSource],
    patterns: &[ActivityPattern],
    unusual_signatures: &[String],
) -> Vec<CriticalPath> {
    let mut paths = Vec::new();

    // Rule 1: top funding sources above the high-value threshold
    let high_value: Vec<&FundingSource> = funding_sources
        .iter()
        .filter(|s| s.total_amount > HIGH_VALUE_SOURCE_THRESHOLD)
        .take(MAX_HIGH_VALUE_SOURCES)
        .collect();
    if !high_value.is_empty() {
        let evidence: Vec<String> = transactions
            .iter()
            .filter(|tx| {
                high_value
                    .iter()
                    .any(|s| tx.record.accounts.iter().any(|a| a == &s.address))
            })
            .map(|tx| tx.signature().to_string())
            .collect();
        let addresses: Vec<&str> = high_value.iter().map(|s| s.address.as_str()).collect();
        paths.push(CriticalPath {
            description: format!("High-value funding sources: {}", addresses.join(", ")),
            evidence,
            risk_weight: HIGH_VALUE_WEIGHT,
        });
    }

    // Rule 2: transactions the clustering collaborator flagged as unusual
    if !unusual_signatures.is_empty() {
        let evidence: Vec<String> = unusual_signatures
            .iter()
            .take(MAX_UNUSUAL_EVIDENCE)
            .cloned()
            .collect();
        paths.push(CriticalPath {
            description: format!(
                "{} transaction(s) flagged as unusual by cluster analysis",
                evidence.len()
            ),
            evidence,
            risk_weight: UNUSUAL_WEIGHT,
        });
    }

    // Rule 3: a high-risk dispersion pattern reads as a mixing indicator
    if let Some(dispersion) = patterns
        .iter()
        .find(|p| p.name == DISPERSION_PATTERN_NAME && p.risk > MIXING_RISK_FLOOR)
    {
        paths.push(CriticalPath {
            description: "Fund dispersion behavior consistent with mixing".to_string(),
            evidence: dispersion.evidence.clone(),
            risk_weight: MIXING_WEIGHT,
        });
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{PatternKind, TransactionRecord, TransactionType};

    fn classified(sig: &str, accounts: &[&str]) -> ClassifiedTransaction {
        ClassifiedTransaction {
            record: TransactionRecord {
                signature: sig.to_string(),
                block_time: Some(1_700_000_000),
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                instructions: vec![],
                logs: None,
                pre_balances: None,
                post_balances: None,
            },
            tx_type: TransactionType::Transfer,
            value: 1.0,
        }
    }

    fn source(address: &str, amount: f64) -> FundingSource {
        FundingSource {
            address: address.to_string(),
            first_seen_signature: format!("{}_first", address),
            first_seen: None,
            last_seen: None,
            total_amount: amount,
            tx_count: 2,
            confidence: 65,
        }
    }

    fn dispersion_pattern(risk: u8, evidence: &[&str]) -> ActivityPattern {
        ActivityPattern {
            kind: PatternKind::Behavioral { address: None },
            name: DISPERSION_PATTERN_NAME.to_string(),
            description: String::new(),
            frequency: 2,
            risk,
            confidence: 85,
            evidence: evidence.iter().map(|s| s.to_string()).collect(),
            first_seen: None,
            last_seen: None,
        }
    }

    #[test]
    fn test_rule_order_high_value_then_unusual() {
        let txs = vec![
            classified("sig1", &["target", "whale"]),
            classified("sig2", &["target", "other"]),
        ];
        let sources = vec![source("whale", 120.0)];
        let unusual = vec![
            "u1".to_string(),
            "u2".to_string(),
            "u3".to_string(),
            "u4".to_string(),
        ];

        let paths = identify_critical_paths(&txs, &sources, &[], &unusual);

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].risk_weight, 30);
        assert_eq!(paths[0].evidence, vec!["sig1"]);
        assert_eq!(paths[1].risk_weight, 70);
        assert_eq!(paths[1].evidence.len(), 4);
    }

    #[test]
    fn test_high_value_entry_capped_at_top_three_sources() {
        let txs = vec![
            classified("sig1", &["target", "s1"]),
            classified("sig2", &["target", "s2"]),
            classified("sig3", &["target", "s3"]),
            classified("sig4", &["target", "s4"]),
        ];
        // Already descending, as the funding tracer guarantees
        let sources = vec![
            source("s1", 500.0),
            source("s2", 400.0),
            source("s3", 300.0),
            source("s4", 200.0),
        ];

        let paths = identify_critical_paths(&txs, &sources, &[], &[]);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].evidence, vec!["sig1", "sig2", "sig3"]);
        assert!(!paths[0].description.contains("s4"));
    }

    #[test]
    fn test_sources_below_threshold_ignored() {
        let txs = vec![classified("sig1", &["target", "minnow"])];
        let sources = vec![source("minnow", 50.0)]; // not strictly above 50
        let paths = identify_critical_paths(&txs, &sources, &[], &[]);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_unusual_evidence_capped_at_ten() {
        let unusual: Vec<String> = (0..15).map(|i| format!("u{}", i)).collect();
        let paths = identify_critical_paths(&[], &[], &[], &unusual);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].evidence.len(), 10);
    }

    #[test]
    fn test_dispersion_pattern_emits_mixing_entry() {
        let pattern = dispersion_pattern(70, &["in1", "out1", "out2", "out3"]);
        let paths = identify_critical_paths(&[], &[], &[pattern], &[]);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].risk_weight, 80);
        assert_eq!(paths[0].evidence, vec!["in1", "out1", "out2", "out3"]);
    }

    #[test]
    fn test_low_risk_dispersion_not_mixing() {
        let pattern = dispersion_pattern(60, &["in1"]);
        let paths = identify_critical_paths(&[], &[], &[pattern], &[]);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_no_inputs_no_paths() {
        assert!(identify_critical_paths(&[], &[], &[], &[]).is_empty());
    }
}
