//! Flow analyzer module
//! Orchestrates the full transaction flow analysis pipeline

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::core::classifier::classify;
use crate::core::clustering::{TransactionClusterer, ValueBandClusterer};
use crate::core::critical_path::identify_critical_paths;
use crate::core::entities::{EntityIdentifier, KnownProgramIdentifier};
use crate::core::funding::trace_funding_sources;
use crate::core::graph::build_graph;
use crate::core::patterns::PatternDetector;
use crate::core::risk_score::aggregate_risk;
use crate::core::value::{classify_direction, Direction, InstructionValueEstimator, ValueEstimator};
use crate::models::types::{
    AnalysisFilters, AnalysisMetrics, AnalysisResult, ClassifiedTransaction, TimelineBucket,
    TransactionRecord,
};

/// Main analyzer struct - drives every stage over one transaction batch.
/// Stateless between invocations; safe to share and call concurrently.
pub struct FlowAnalyzer {
    /// Pattern sub-detectors with their thresholds
    detector: PatternDetector,
    /// Pluggable value estimation
    estimator: Box<dyn ValueEstimator>,
    /// Entity identification collaborator
    entity_identifier: Box<dyn EntityIdentifier>,
    /// Transaction clustering collaborator
    clusterer: Box<dyn TransactionClusterer>,
}

impl FlowAnalyzer {
    /// Analyzer with the built-in estimator and collaborators
    pub fn new() -> Self {
        Self::with_collaborators(
            DetectorConfig::default(),
            Box::new(InstructionValueEstimator),
            Box::new(KnownProgramIdentifier),
            Box::new(ValueBandClusterer),
        )
    }

    /// Full injection point for alternative estimators and collaborators
    pub fn with_collaborators(
        config: DetectorConfig,
        estimator: Box<dyn ValueEstimator>,
        entity_identifier: Box<dyn EntityIdentifier>,
        clusterer: Box<dyn TransactionClusterer>,
    ) -> Self {
        Self {
            detector: PatternDetector::new(config),
            estimator,
            entity_identifier,
            clusterer,
        }
    }

    /// Analyze a transaction batch for a target address
    pub fn analyze(
        &self,
        transactions: &[TransactionRecord],
        target: &str,
        filters: &AnalysisFilters,
    ) -> AnalysisResult {
        self.analyze_with_balance(transactions, target, None, filters)
    }

    /// Same as [`analyze`](Self::analyze) with a known target balance, which
    /// ends up on the target graph node
    pub fn analyze_with_balance(
        &self,
        transactions: &[TransactionRecord],
        target: &str,
        target_balance: Option<f64>,
        filters: &AnalysisFilters,
    ) -> AnalysisResult {
        // Classification and estimation happen before filtering because the
        // amount and type filters compare derived fields
        let classified: Vec<ClassifiedTransaction> = transactions
            .iter()
            .map(|tx| ClassifiedTransaction {
                tx_type: classify(tx),
                value: self.estimator.estimate_value(tx),
                record: tx.clone(),
            })
            .collect();

        let filtered = apply_filters(classified, filters);
        if filtered.is_empty() {
            debug!("No transactions to analyze for {} after filtering", target);
            return AnalysisResult::empty(target);
        }

        let (nodes, edges) = build_graph(&filtered, target, target_balance);
        let funding_sources = trace_funding_sources(&filtered, target);
        let patterns = self.detector.detect_all(&filtered, target);
        let entities = self.entity_identifier.identify_entities(&filtered, target);
        let clusters = self.clusterer.cluster_transactions(&filtered, target);
        let risk_score = aggregate_risk(&funding_sources, &patterns);
        let critical_paths = identify_critical_paths(
            &filtered,
            &funding_sources,
            &patterns,
            &clusters.unusual_transactions,
        );

        let (total_inflow, total_outflow) = flow_totals(&filtered, target);
        let timeline = build_timeline(&filtered);
        let metrics = AnalysisMetrics {
            transaction_count: filtered.len() as u32,
            node_count: nodes.len() as u32,
            total_volume: filtered.iter().map(|tx| tx.value).sum(),
            risk_score,
            unusual_count: clusters.unusual_transactions.len() as u32,
        };

        info!(
            "✅ Analysis complete | Target: {} | Txs: {} | Patterns: {} | Risk: {}/100",
            target,
            filtered.len(),
            patterns.len(),
            risk_score
        );

        AnalysisResult {
            target: target.to_string(),
            nodes,
            edges,
            funding_sources,
            patterns,
            critical_paths,
            entities,
            clusters,
            total_inflow,
            total_outflow,
            risk_score,
            timeline,
            metrics,
            analyzed_at: Utc::now(),
        }
    }
}

impl Default for FlowAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the pre-analysis filters. Date bounds require a block time, so
/// undated records drop out whenever a date bound is set.
fn apply_filters(
    transactions: Vec<ClassifiedTransaction>,
    filters: &AnalysisFilters,
) -> Vec<ClassifiedTransaction> {
    if filters.is_empty() {
        return transactions;
    }

    transactions
        .into_iter()
        .filter(|tx| {
            if let Some(from) = filters.date_from {
                match tx.record.block_datetime() {
                    Some(dt) if dt >= from => {}
                    _ => return false,
                }
            }
            if let Some(to) = filters.date_to {
                match tx.record.block_datetime() {
                    Some(dt) if dt <= to => {}
                    _ => return false,
                }
            }
            if let Some(min) = filters.min_amount {
                if tx.value < min {
                    return false;
                }
            }
            if let Some(max) = filters.max_amount {
                if tx.value > max {
                    return false;
                }
            }
            if let Some(ref types) = filters.tx_types {
                if !types.contains(&tx.tx_type) {
                    return false;
                }
            }
            if let Some(ref query) = filters.address_query {
                if !tx.record.accounts.iter().any(|a| a.contains(query.as_str())) {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Sum estimated values into inflow and outflow by direction. Indeterminate
/// transactions contribute to neither.
fn flow_totals(transactions: &[ClassifiedTransaction], target: &str) -> (f64, f64) {
    let mut inflow = 0.0;
    let mut outflow = 0.0;
    for tx in transactions {
        match classify_direction(&tx.record, target) {
            Direction::Incoming => inflow += tx.value,
            Direction::Outgoing => outflow += tx.value,
            Direction::Indeterminate => {}
        }
    }
    (inflow, outflow)
}

/// Calendar-day activity buckets, ascending by date. Undated transactions
/// have no day to land in and are left out.
fn build_timeline(transactions: &[ClassifiedTransaction]) -> Vec<TimelineBucket> {
    let mut days: BTreeMap<NaiveDate, (u32, f64)> = BTreeMap::new();
    for tx in transactions {
        if let Some(dt) = tx.record.block_datetime() {
            let entry = days.entry(dt.date_naive()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += tx.value;
        }
    }
    days.into_iter()
        .map(|(date, (tx_count, volume))| TimelineBucket {
            date,
            tx_count,
            volume,
        })
        .collect()
}
