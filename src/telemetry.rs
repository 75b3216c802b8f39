//! Telemetry Module
//!
//! In-process counters and a buffered event log for analysis activity:
//! - Analyses run, transactions processed, patterns detected
//! - High-risk result counts and average risk score
//! - Analysis latency
//! - Per-analysis events flushed to JSONL under `./telemetry/`
//!
//! No wallet addresses or signatures are stored; events keep only a
//! four-character target prefix and rounded volume.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::{AnalysisResult, RiskLevel};

/// Single analysis event (anonymized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEvent {
    /// Unix timestamp
    pub timestamp: u64,
    /// First four characters of the analyzed address
    pub target_prefix: String,
    /// Final aggregated risk score
    pub risk_score: u8,
    /// Risk band the score falls into
    pub risk_level: RiskLevel,
    /// Transactions that survived filtering
    pub transaction_count: u32,
    /// Behavioral patterns detected
    pub pattern_count: u32,
    /// Funding sources traced
    pub funding_source_count: u32,
    /// Total flow volume in SOL, rounded to 0.1 to hide exact amounts
    pub volume_sol: f64,
    /// Analysis latency in milliseconds
    pub latency_ms: u64,
}

impl AnalysisEvent {
    pub fn new(result: &AnalysisResult, latency_ms: u64) -> Self {
        Self {
            timestamp: current_timestamp(),
            target_prefix: result.target.chars().take(4).collect(),
            risk_score: result.risk_score,
            risk_level: result.risk_level(),
            transaction_count: result.metrics.transaction_count,
            pattern_count: result.patterns.len() as u32,
            funding_source_count: result.funding_sources.len() as u32,
            volume_sol: (result.metrics.total_volume * 10.0).round() / 10.0,
            latency_ms,
        }
    }
}

/// Aggregated statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    /// Total analyses completed
    pub total_analyses: u64,
    /// Total analyses that failed (fetch or internal errors)
    pub failed_analyses: u64,
    /// Total transactions processed across all analyses
    pub total_transactions: u64,
    /// Total behavioral patterns detected
    pub total_patterns: u64,
    /// Analyses that scored HIGH or CRITICAL
    pub high_risk_analyses: u64,
    /// Pattern detections keyed by pattern name
    pub patterns_by_name: HashMap<String, u64>,
    /// Average risk score over all completed analyses
    pub avg_risk_score: f64,
    /// Average analysis latency in milliseconds
    pub avg_latency_ms: f64,
    /// Session start timestamp (unix seconds)
    pub period_start: u64,
    /// Snapshot timestamp (unix seconds)
    pub period_end: u64,
}

/// Main telemetry collector
///
/// Counters are atomic so handlers record without contention; the
/// per-pattern map and the event buffer take a lock.
pub struct TelemetryCollector {
    /// Event buffer (in-memory)
    events: RwLock<Vec<AnalysisEvent>>,
    total_analyses: AtomicU64,
    failed_analyses: AtomicU64,
    total_transactions: AtomicU64,
    total_patterns: AtomicU64,
    high_risk_analyses: AtomicU64,
    total_risk_points: AtomicU64,
    total_latency_ms: AtomicU64,
    pattern_counts: RwLock<HashMap<String, u64>>,
    session_start: u64,
    /// Export directory
    export_dir: PathBuf,
    /// Max events in memory before flush
    max_buffer_size: usize,
}

impl TelemetryCollector {
    /// Create new collector with default settings
    pub fn new() -> Self {
        Self::with_config(PathBuf::from("./telemetry"), 1000)
    }

    /// Create collector with custom config
    pub fn with_config(export_dir: PathBuf, max_buffer_size: usize) -> Self {
        // Ensure export directory exists
        let _ = fs::create_dir_all(&export_dir);

        Self {
            events: RwLock::new(Vec::with_capacity(max_buffer_size)),
            total_analyses: AtomicU64::new(0),
            failed_analyses: AtomicU64::new(0),
            total_transactions: AtomicU64::new(0),
            total_patterns: AtomicU64::new(0),
            high_risk_analyses: AtomicU64::new(0),
            total_risk_points: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            pattern_counts: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
            export_dir,
            max_buffer_size,
        }
    }

    /// Record a completed analysis
    pub fn record_analysis(&self, result: &AnalysisResult, latency_ms: u64) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.total_transactions
            .fetch_add(result.metrics.transaction_count as u64, Ordering::Relaxed);
        self.total_patterns
            .fetch_add(result.patterns.len() as u64, Ordering::Relaxed);
        self.total_risk_points
            .fetch_add(result.risk_score as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);

        if matches!(result.risk_level(), RiskLevel::High | RiskLevel::Critical) {
            self.high_risk_analyses.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut counts) = self.pattern_counts.write() {
            for pattern in &result.patterns {
                *counts.entry(pattern.name.clone()).or_insert(0) += 1;
            }
        }

        // Buffer event
        if let Ok(mut events) = self.events.write() {
            events.push(AnalysisEvent::new(result, latency_ms));

            // Auto-flush if buffer full
            if events.len() >= self.max_buffer_size {
                let events_to_flush = std::mem::take(&mut *events);
                drop(events); // Release lock before I/O
                let _ = self.write_events(&events_to_flush);
            }
        }
    }

    /// Record an analysis that failed before producing a result
    pub fn record_failure(&self) {
        self.failed_analyses.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        let total_analyses = self.total_analyses.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let total_risk = self.total_risk_points.load(Ordering::Relaxed);

        let (avg_latency_ms, avg_risk_score) = if total_analyses > 0 {
            (
                total_latency as f64 / total_analyses as f64,
                total_risk as f64 / total_analyses as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let patterns_by_name = self
            .pattern_counts
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default();

        TelemetryStats {
            total_analyses,
            failed_analyses: self.failed_analyses.load(Ordering::Relaxed),
            total_transactions: self.total_transactions.load(Ordering::Relaxed),
            total_patterns: self.total_patterns.load(Ordering::Relaxed),
            high_risk_analyses: self.high_risk_analyses.load(Ordering::Relaxed),
            patterns_by_name,
            avg_risk_score,
            avg_latency_ms,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Drain the event buffer to disk
    pub fn flush_events(&self) -> Result<(), std::io::Error> {
        let drained = match self.events.write() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => return Ok(()),
        };
        self.write_events(&drained)
    }

    /// Export current stats to JSON file
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        let stats = self.get_stats();
        let filename = format!("stats_{}.json", current_timestamp());
        let path = self.export_dir.join(filename);

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Append events as JSONL
    fn write_events(&self, events: &[AnalysisEvent]) -> Result<(), std::io::Error> {
        if events.is_empty() {
            return Ok(());
        }

        let filename = format!("events_{}.jsonl", current_timestamp());
        let path = self.export_dir.join(filename);

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        for event in events {
            if let Ok(json) = serde_json::to_string(event) {
                writeln!(file, "{}", json)?;
            }
        }

        Ok(())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{ActivityPattern, PatternKind};

    fn result_with(score: u8, pattern_names: &[&str], tx_count: u32) -> AnalysisResult {
        let mut result = AnalysisResult::empty("target");
        result.risk_score = score;
        result.metrics.transaction_count = tx_count;
        result.metrics.risk_score = score;
        result.patterns = pattern_names
            .iter()
            .map(|name| ActivityPattern {
                kind: PatternKind::Temporal { hour: 0 },
                name: name.to_string(),
                description: String::new(),
                frequency: 1,
                risk: 20,
                confidence: 70,
                evidence: vec![],
                first_seen: None,
                last_seen: None,
            })
            .collect();
        result
    }

    fn fresh_export_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "flowscope_telemetry_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn event_files(dir: &PathBuf) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| {
                        p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with("events_"))
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_collector_counts_analyses_and_patterns() {
        let collector =
            TelemetryCollector::with_config(fresh_export_dir("counts"), 100);
        collector.record_analysis(&result_with(30, &["Temporal Activity Pattern"], 10), 40);
        collector.record_analysis(&result_with(80, &["Temporal Activity Pattern", "Fund Dispersion Pattern"], 20), 60);
        collector.record_failure();

        let stats = collector.get_stats();
        assert_eq!(stats.total_analyses, 2);
        assert_eq!(stats.failed_analyses, 1);
        assert_eq!(stats.total_transactions, 30);
        assert_eq!(stats.total_patterns, 3);
        assert_eq!(stats.high_risk_analyses, 1);
        assert_eq!(stats.patterns_by_name["Temporal Activity Pattern"], 2);
        assert_eq!(stats.patterns_by_name["Fund Dispersion Pattern"], 1);
        assert_eq!(stats.avg_risk_score, 55.0);
        assert_eq!(stats.avg_latency_ms, 50.0);
    }

    #[test]
    fn test_empty_collector_has_zero_averages() {
        let collector =
            TelemetryCollector::with_config(fresh_export_dir("empty"), 100);
        let stats = collector.get_stats();
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.avg_risk_score, 0.0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_event_anonymizes_target_and_rounds_volume() {
        let mut result = result_with(72, &["Fund Dispersion Pattern"], 12);
        result.target = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string();
        result.metrics.total_volume = 12.3456;

        let event = AnalysisEvent::new(&result, 25);
        assert_eq!(event.target_prefix, "9WzD");
        assert_eq!(event.volume_sol, 12.3);
        assert_eq!(event.risk_level, RiskLevel::High);
        assert_eq!(event.pattern_count, 1);
        assert_eq!(event.latency_ms, 25);
    }

    #[test]
    fn test_auto_flush_drains_full_buffer() {
        let dir = fresh_export_dir("autoflush");
        let collector = TelemetryCollector::with_config(dir.clone(), 3);

        for i in 0..3 {
            collector.record_analysis(&result_with(30, &[], i), 10);
        }

        let files = event_files(&dir);
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("\"target_prefix\":\"targ\""));

        // Buffer was drained, nothing left to flush
        collector.flush_events().unwrap();
        assert_eq!(event_files(&dir).len(), 1);
    }

    #[test]
    fn test_manual_flush_writes_partial_buffer() {
        let dir = fresh_export_dir("manualflush");
        let collector = TelemetryCollector::with_config(dir.clone(), 100);

        collector.record_analysis(&result_with(40, &[], 5), 10);
        collector.record_analysis(&result_with(50, &[], 6), 12);
        collector.flush_events().unwrap();

        let files = event_files(&dir);
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_stats_export_writes_json_file() {
        let dir = fresh_export_dir("statsexport");
        let collector = TelemetryCollector::with_config(dir, 100);
        collector.record_analysis(&result_with(30, &["Temporal Activity Pattern"], 10), 40);

        let path = collector.export_stats_json().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"total_analyses\": 1"));
        assert!(content.contains("Temporal Activity Pattern"));
    }
}
