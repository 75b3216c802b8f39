//! Type definitions for FlowScope
//! All core data structures for transaction flow analysis

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification for an analyzed address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Address appears safe
    Safe,
    /// Low risk - minor concerns
    Low,
    /// Medium risk - proceed with caution
    Medium,
    /// High risk - strong behavioral signals
    High,
    /// Critical - multiple high-confidence risk signals
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "✅",
            RiskLevel::Low => "🟡",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }

    /// Map a 0-100 risk score onto a level
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=19 => RiskLevel::Safe,
            20..=39 => RiskLevel::Low,
            40..=59 => RiskLevel::Medium,
            60..=79 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// Semantic transaction type derived from the programs a transaction touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Transfer,
    Swap,
    Nft,
    Defi,
    Other,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::Swap => "swap",
            TransactionType::Nft => "nft",
            TransactionType::Defi => "defi",
            TransactionType::Other => "other",
        }
    }
}

/// A single instruction inside a transaction, with account indices already
/// resolved to addresses and data decoded to raw bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionRecord {
    pub program_id: String,
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Raw transaction record as handed to the engine by the fetch layer.
/// Immutable input; signature is unique within one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub signature: String,
    /// Unix seconds; records without a block time sort last
    pub block_time: Option<i64>,
    /// Ordered account addresses involved in the transaction
    pub accounts: Vec<String>,
    pub instructions: Vec<InstructionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    /// Native-unit balances per account index, before execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_balances: Option<Vec<u64>>,
    /// Native-unit balances per account index, after execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_balances: Option<Vec<u64>>,
}

impl TransactionRecord {
    /// Block time as a UTC instant, if present
    pub fn block_datetime(&self) -> Option<DateTime<Utc>> {
        self.block_time.and_then(|t| DateTime::from_timestamp(t, 0))
    }

    /// First account that is not the target, the attributed counterparty for
    /// single-sender heuristics
    pub fn first_counterparty(&self, target: &str) -> Option<&str> {
        self.accounts
            .iter()
            .map(|a| a.as_str())
            .find(|a| *a != target)
    }
}

/// A transaction annotated with its semantic type and estimated value (SOL).
/// Derived once per analysis, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub tx_type: TransactionType,
    /// Estimated value moved, in SOL; 0 when nothing could be estimated
    pub value: f64,
}

impl ClassifiedTransaction {
    pub fn signature(&self) -> &str {
        &self.record.signature
    }

    pub fn block_time(&self) -> Option<i64> {
        self.record.block_time
    }
}

/// Node role in the interaction graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Wallet,
    Program,
}

/// A node in the interaction graph, keyed by address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub address: String,
    pub role: NodeRole,
    /// Number of analyzed transactions touching this node
    pub tx_count: u32,
    pub last_active: Option<DateTime<Utc>>,
    /// Only known for the target node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

/// An edge in the interaction graph. One edge per (transaction, counterparty)
/// pair; identity is the `target|account|signature` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub signature: String,
    pub tx_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}

/// A confidence-scored funding source for the target address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingSource {
    pub address: String,
    pub first_seen_signature: String,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    /// Cumulative estimated amount received from this source, in SOL
    pub total_amount: f64,
    pub tx_count: u32,
    /// 0-100; starts at 60, +5 per repeat observation, capped at 100
    pub confidence: u8,
}

/// Variant-specific payload of a detected activity pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternKind {
    /// Recurring hour-of-day activity
    Temporal { hour: u32 },
    /// Repeated transaction value (rounded to 3 decimals)
    Value { value: f64 },
    /// Dominant single counterparty
    Endpoint { address: String },
    /// Structural behavior (dispersion, circular movement)
    Behavioral {
        #[serde(skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
}

/// A detected activity pattern. Derived fact, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPattern {
    #[serde(flatten)]
    pub kind: PatternKind,
    pub name: String,
    pub description: String,
    /// Occurrence count backing the pattern
    pub frequency: u32,
    /// 0-100, fixed per pattern kind
    pub risk: u8,
    /// 0-100, independent of risk
    pub confidence: u8,
    /// Ordered evidence signatures
    pub evidence: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// A narratively flagged subset of transactions worth human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    pub description: String,
    pub evidence: Vec<String>,
    /// 0-100 weight assigned by the emitting rule
    pub risk_weight: u8,
}

/// Entity label produced by the entity-identification collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLabel {
    pub address: String,
    pub name: String,
    pub entity_type: String,
    pub confidence: u8,
}

/// One cluster of related transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCluster {
    pub label: String,
    pub signatures: Vec<String>,
    pub total_value: f64,
}

/// Output of the transaction-clustering collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub clusters: Vec<TransactionCluster>,
    pub unusual_transactions: Vec<String>,
    pub high_value_transactions: Vec<String>,
}

/// Per-day activity bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub date: NaiveDate,
    pub tx_count: u32,
    /// Total estimated value for the day, in SOL
    pub volume: f64,
}

/// Top-line metrics for an analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub transaction_count: u32,
    pub node_count: u32,
    pub total_volume: f64,
    pub risk_score: u8,
    pub unusual_count: u32,
}

/// Filters applied before any analysis stage runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    /// Allow-list of semantic types; None admits every type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_types: Option<Vec<TransactionType>>,
    /// Substring matched against each transaction's account addresses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_query: Option<String>,
}

impl AnalysisFilters {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.tx_types.is_none()
            && self.address_query.is_none()
    }
}

/// Result of a full flow analysis. Value object, recomputed per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub target: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub funding_sources: Vec<FundingSource>,
    pub patterns: Vec<ActivityPattern>,
    pub critical_paths: Vec<CriticalPath>,
    pub entities: Vec<EntityLabel>,
    pub clusters: ClusterReport,
    /// Sum of estimated value on incoming transactions, in SOL
    pub total_inflow: f64,
    /// Sum of estimated value on outgoing transactions, in SOL
    pub total_outflow: f64,
    /// Consolidated 0-100 risk score
    pub risk_score: u8,
    pub timeline: Vec<TimelineBucket>,
    pub metrics: AnalysisMetrics,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Well-defined empty result for empty or filtered-to-empty input
    pub fn empty(target: &str) -> Self {
        Self {
            target: target.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            funding_sources: Vec::new(),
            patterns: Vec::new(),
            critical_paths: Vec::new(),
            entities: Vec::new(),
            clusters: ClusterReport::default(),
            total_inflow: 0.0,
            total_outflow: 0.0,
            risk_score: 0,
            timeline: Vec::new(),
            metrics: AnalysisMetrics::default(),
            analyzed_at: Utc::now(),
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }

    /// Pretty print a short report
    pub fn summary(&self) -> String {
        let level = self.risk_level();
        let mut output = format!(
            "\n{} Risk: {} ({}/100) | Target: {}\n",
            level.emoji(),
            level.as_str(),
            self.risk_score,
            self.target
        );
        output.push_str(&format!(
            "   Transactions: {} | Nodes: {} | Volume: {:.4} SOL\n",
            self.metrics.transaction_count, self.metrics.node_count, self.metrics.total_volume
        ));
        output.push_str(&format!(
            "   Inflow: {:.4} SOL | Outflow: {:.4} SOL\n",
            self.total_inflow, self.total_outflow
        ));

        if !self.funding_sources.is_empty() {
            output.push_str("   Funding sources:\n");
            for source in self.funding_sources.iter().take(5) {
                output.push_str(&format!(
                    "     - {} ({:.4} SOL over {} txs, confidence {})\n",
                    source.address, source.total_amount, source.tx_count, source.confidence
                ));
            }
        }

        if !self.patterns.is_empty() {
            output.push_str("   Patterns:\n");
            for pattern in &self.patterns {
                output.push_str(&format!(
                    "     - {} (risk {}, confidence {}): {}\n",
                    pattern.name, pattern.risk, pattern.confidence, pattern.description
                ));
            }
        }

        if !self.critical_paths.is_empty() {
            output.push_str("   Critical paths:\n");
            for path in &self.critical_paths {
                output.push_str(&format!(
                    "     - [{}] {} ({} signatures)\n",
                    path.risk_weight,
                    path.description,
                    path.evidence.len()
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(45), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(75), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn test_empty_result_is_all_zero() {
        let result = AnalysisResult::empty("SomeTarget111");
        assert_eq!(result.target, "SomeTarget111");
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
        assert!(result.funding_sources.is_empty());
        assert!(result.patterns.is_empty());
        assert!(result.critical_paths.is_empty());
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.total_inflow, 0.0);
        assert_eq!(result.total_outflow, 0.0);
        assert_eq!(result.metrics.transaction_count, 0);
    }

    #[test]
    fn test_first_counterparty_skips_target() {
        let tx = TransactionRecord {
            signature: "sig1".to_string(),
            block_time: None,
            accounts: vec!["target".to_string(), "other".to_string()],
            instructions: Vec::new(),
            logs: None,
            pre_balances: None,
            post_balances: None,
        };
        assert_eq!(tx.first_counterparty("target"), Some("other"));
        assert_eq!(tx.first_counterparty("other"), Some("target"));
        assert_eq!(tx.first_counterparty("neither"), Some("target"));
    }

    #[test]
    fn test_filters_is_empty() {
        assert!(AnalysisFilters::default().is_empty());
        let filters = AnalysisFilters {
            min_amount: Some(1.0),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_pattern_kind_serializes_tagged() {
        let kind = PatternKind::Temporal { hour: 14 };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "temporal");
        assert_eq!(json["hour"], 14);
    }
}
