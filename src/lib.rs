//! FlowScope Library
//!
//! Transaction flow analysis engine for Solana accounts:
//! - Funding source tracing with confidence scoring
//! - Behavioral pattern detection (temporal, value, counterparty,
//!   dispersion, circular movement)
//! - Explainable 0-100 risk aggregation
//! - Critical path identification for human review

pub mod analyzer;
pub mod api;
pub mod config;
pub mod core;
pub mod models;
pub mod providers;
pub mod telemetry;
pub mod utils;

pub use analyzer::FlowAnalyzer;
pub use config::{DetectorConfig, EngineConfig};
pub use crate::core::classifier::classify;
pub use crate::core::clustering::{TransactionClusterer, ValueBandClusterer};
pub use crate::core::critical_path::identify_critical_paths;
pub use crate::core::entities::{EntityIdentifier, KnownProgramIdentifier};
pub use crate::core::funding::trace_funding_sources;
pub use crate::core::graph::build_graph;
pub use crate::core::patterns::PatternDetector;
pub use crate::core::risk_score::{aggregate_risk, RiskSummary, ScoreFactor};
pub use crate::core::value::{classify_direction, Direction, InstructionValueEstimator, ValueEstimator};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    ActivityPattern, AnalysisFilters, AnalysisResult, ClassifiedTransaction, ClusterReport,
    CriticalPath, EntityLabel, FundingSource, GraphEdge, GraphNode, InstructionRecord, RiskLevel,
    TransactionRecord, TransactionType,
};
pub use providers::solana::SolanaClient;
pub use telemetry::{AnalysisEvent, TelemetryCollector, TelemetryStats};
pub use utils::cache::{AnalysisCache, CacheStats};
