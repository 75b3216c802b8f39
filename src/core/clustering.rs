//! Transaction Clustering
//! Injected collaborator boundary plus the built-in value-band clusterer

use crate::models::types::{ClassifiedTransaction, ClusterReport, TransactionCluster, TransactionType};
use std::cmp::Ordering;

/// Outlier detection needs at least this many non-zero values
const MIN_OUTLIER_SAMPLE: usize = 5;
/// Values beyond mean + this many standard deviations are unusual
const OUTLIER_SIGMA: f64 = 2.0;
/// Size of the high-value shortlist
const MAX_HIGH_VALUE: usize = 10;

/// Groups the analyzed history into clusters and flags unusual and
/// high-value transactions. The unusual set feeds critical-path rule two;
/// everything else is merged verbatim into the report.
pub trait TransactionClusterer: Send + Sync {
    fn cluster_transactions(
        &self,
        transactions: &[ClassifiedTransaction],
        target: &str,
    ) -> ClusterReport;
}

/// Default clusterer: one cluster per semantic type, statistical outliers as
/// unusual (strictly above mean + 2 sigma of non-zero values), and the ten
/// largest values as the high-value shortlist.
pub struct ValueBandClusterer;

impl TransactionClusterer for ValueBandClusterer {
    fn cluster_transactions(
        &self,
        transactions: &[ClassifiedTransaction],
        _target: &str,
    ) -> ClusterReport {
        if transactions.is_empty() {
            return ClusterReport::default();
        }

        let mut clusters = Vec::new();
        for tx_type in [
            TransactionType::Transfer,
            TransactionType::Swap,
            TransactionType::Nft,
            TransactionType::Defi,
            TransactionType::Other,
        ] {
            let members: Vec<&ClassifiedTransaction> = transactions
                .iter()
                .filter(|tx| tx.tx_type == tx_type)
                .collect();
            if members.is_empty() {
                continue;
            }
            clusters.push(TransactionCluster {
                label: tx_type.as_str().to_string(),
                signatures: members.iter().map(|tx| tx.signature().to_string()).collect(),
                total_value: members.iter().map(|tx| tx.value).sum(),
            });
        }

        let nonzero: Vec<&ClassifiedTransaction> = transactions
            .iter()
            .filter(|tx| tx.value > 0.0)
            .collect();

        let unusual_transactions = if nonzero.len() >= MIN_OUTLIER_SAMPLE {
            let mean = nonzero.iter().map(|tx| tx.value).sum::<f64>() / nonzero.len() as f64;
            let variance = nonzero
                .iter()
                .map(|tx| (tx.value - mean).powi(2))
                .sum::<f64>()
                / nonzero.len() as f64;
            let threshold = mean + OUTLIER_SIGMA * variance.sqrt();
            nonzero
                .iter()
                .filter(|tx| tx.value > threshold)
                .map(|tx| tx.signature().to_string())
                .collect()
        } else {
            Vec::new()
        };

        let mut by_value = nonzero;
        by_value.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        let high_value_transactions = by_value
            .iter()
            .take(MAX_HIGH_VALUE)
            .map(|tx| tx.signature().to_string())
            .collect();

        ClusterReport {
            clusters,
            unusual_transactions,
            high_value_transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::TransactionRecord;

    fn classified(sig: &str, tx_type: TransactionType, value: f64) -> ClassifiedTransaction {
        ClassifiedTransaction {
            record: TransactionRecord {
                signature: sig.to_string(),
                block_time: Some(1_700_000_000),
                accounts: vec!["target".to_string(), "other".to_string()],
                instructions: vec![],
                logs: None,
                pre_balances: None,
                post_balances: None,
            },
            tx_type,
            value,
        }
    }

    #[test]
    fn test_empty_input_yields_default_report() {
        let report = ValueBandClusterer.cluster_transactions(&[], "target");
        assert!(report.clusters.is_empty());
        assert!(report.unusual_transactions.is_empty());
        assert!(report.high_value_transactions.is_empty());
    }

    #[test]
    fn test_clusters_group_by_type() {
        let txs = vec![
            classified("t1", TransactionType::Transfer, 1.0),
            classified("s1", TransactionType::Swap, 2.0),
            classified("t2", TransactionType::Transfer, 3.0),
        ];
        let report = ValueBandClusterer.cluster_transactions(&txs, "target");

        assert_eq!(report.clusters.len(), 2);
        assert_eq!(report.clusters[0].label, "transfer");
        assert_eq!(report.clusters[0].signatures, vec!["t1", "t2"]);
        assert_eq!(report.clusters[0].total_value, 4.0);
        assert_eq!(report.clusters[1].label, "swap");
    }

    #[test]
    fn test_statistical_outliers_flagged_unusual() {
        let mut txs: Vec<ClassifiedTransaction> = (0..9)
            .map(|i| classified(&format!("small{}", i), TransactionType::Transfer, 1.0))
            .collect();
        txs.push(classified("spike", TransactionType::Transfer, 100.0));

        let report = ValueBandClusterer.cluster_transactions(&txs, "target");
        assert_eq!(report.unusual_transactions, vec!["spike"]);
    }

    #[test]
    fn test_uniform_values_have_no_outliers() {
        let txs: Vec<ClassifiedTransaction> = (0..10)
            .map(|i| classified(&format!("sig{}", i), TransactionType::Transfer, 5.0))
            .collect();
        let report = ValueBandClusterer.cluster_transactions(&txs, "target");
        assert!(report.unusual_transactions.is_empty());
    }

    #[test]
    fn test_small_samples_skip_outlier_detection() {
        let txs = vec![
            classified("a", TransactionType::Transfer, 1.0),
            classified("b", TransactionType::Transfer, 1000.0),
        ];
        let report = ValueBandClusterer.cluster_transactions(&txs, "target");
        assert!(report.unusual_transactions.is_empty());
    }

    #[test]
    fn test_high_value_shortlist_is_top_ten_descending() {
        let txs: Vec<ClassifiedTransaction> = (1..=12)
            .map(|i| classified(&format!("sig{}", i), TransactionType::Transfer, i as f64))
            .collect();
        let report = ValueBandClusterer.cluster_transactions(&txs, "target");

        assert_eq!(report.high_value_transactions.len(), 10);
        assert_eq!(report.high_value_transactions[0], "sig12");
        assert_eq!(report.high_value_transactions[9], "sig3");
    }
}
