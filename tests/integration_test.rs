//! Integration tests for the FlowScope analysis pipeline

use flowscope::utils::constants::{LAMPORTS_PER_SOL, SYSTEM_PROGRAM};
use flowscope::{
    AnalysisFilters, FlowAnalyzer, InstructionRecord, RiskLevel, TransactionRecord,
};

/// Native transfer record: u32 LE discriminant 2 plus u64 LE lamports
fn system_transfer(
    sig: &str,
    block_time: Option<i64>,
    from: &str,
    to: &str,
    sol: f64,
) -> TransactionRecord {
    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&((sol * LAMPORTS_PER_SOL as f64) as u64).to_le_bytes());
    TransactionRecord {
        signature: sig.to_string(),
        block_time,
        accounts: vec![from.to_string(), to.to_string()],
        instructions: vec![InstructionRecord {
            program_id: SYSTEM_PROGRAM.to_string(),
            accounts: vec![from.to_string(), to.to_string()],
            data,
        }],
        logs: None,
        pre_balances: None,
        post_balances: None,
    }
}

// 2024-01-15 14:00:00 UTC
const DAY_ONE_14H: i64 = 1_705_327_200;
// 2024-01-16 14:00:00 UTC
const DAY_TWO_14H: i64 = DAY_ONE_14H + 86_400;

/// Six identical 10 SOL transfers from one funder, same hour of day,
/// spread over two days
fn repeated_funding_history() -> Vec<TransactionRecord> {
    vec![
        system_transfer("sig-1", Some(DAY_ONE_14H), "FunderX", "Target1", 10.0),
        system_transfer("sig-2", Some(DAY_ONE_14H + 600), "FunderX", "Target1", 10.0),
        system_transfer("sig-3", Some(DAY_ONE_14H + 1200), "FunderX", "Target1", 10.0),
        system_transfer("sig-4", Some(DAY_TWO_14H), "FunderX", "Target1", 10.0),
        system_transfer("sig-5", Some(DAY_TWO_14H + 600), "FunderX", "Target1", 10.0),
        system_transfer("sig-6", Some(DAY_TWO_14H + 1800), "FunderX", "Target1", 10.0),
    ]
}

#[test]
fn test_repeated_funding_end_to_end() {
    let analyzer = FlowAnalyzer::new();
    let txs = repeated_funding_history();
    let result = analyzer.analyze(&txs, "Target1", &AnalysisFilters::default());

    // One funding source with stepped-up confidence
    assert_eq!(result.funding_sources.len(), 1);
    let source = &result.funding_sources[0];
    assert_eq!(source.address, "FunderX");
    assert_eq!(source.total_amount, 60.0);
    assert_eq!(source.tx_count, 6);
    assert_eq!(source.confidence, 85, "60 base + 5 per repeat observation");

    // Temporal, value repetition and frequent counterparty, in that order
    let names: Vec<&str> = result.patterns.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Temporal Activity Pattern",
            "Value Repetition Pattern",
            "Frequent Counterparty Pattern"
        ]
    );
    assert_eq!(result.patterns[0].risk, 20);
    assert_eq!(result.patterns[0].confidence, 70);
    assert_eq!(result.patterns[1].risk, 20);
    assert_eq!(result.patterns[1].confidence, 75);
    assert_eq!(result.patterns[2].risk, 30);
    assert_eq!(result.patterns[2].confidence, 80);

    // 20 base + mean of confidence-weighted pattern risks
    assert_eq!(result.risk_score, 38);
    assert_eq!(result.risk_level(), RiskLevel::Low);

    // Flow totals and daily buckets
    assert_eq!(result.total_inflow, 60.0);
    assert_eq!(result.total_outflow, 0.0);
    assert_eq!(result.timeline.len(), 2);
    assert_eq!(result.timeline[0].tx_count, 3);
    assert_eq!(result.timeline[0].volume, 30.0);
    assert_eq!(result.timeline[1].tx_count, 3);

    // Funder above the high-value threshold becomes the critical path
    assert_eq!(result.critical_paths.len(), 1);
    assert_eq!(result.critical_paths[0].risk_weight, 30);
    assert_eq!(result.critical_paths[0].evidence.len(), 6);

    // The system program is the only recognizable entity
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].name, "System Program");
    assert_eq!(result.entities[0].confidence, 95);

    // Graph: target plus funder, one edge per transaction
    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.edges.len(), 6);
    assert_eq!(result.metrics.transaction_count, 6);
    assert_eq!(result.metrics.risk_score, 38);
}

#[test]
fn test_dispersion_scenario_orders_critical_paths_by_rule() {
    // Two receive-then-disperse rounds: 30 SOL in, three 1 SOL hops out
    let t0 = 1_705_320_000; // 2024-01-15 12:00:00 UTC
    let txs = vec![
        system_transfer("in-1", Some(t0), "FunderX", "Target1", 30.0),
        system_transfer("out-1", Some(t0 + 60), "Target1", "HopA", 1.0),
        system_transfer("out-2", Some(t0 + 120), "Target1", "HopB", 1.0),
        system_transfer("out-3", Some(t0 + 180), "Target1", "HopC", 1.0),
        system_transfer("in-2", Some(t0 + 7200), "FunderX", "Target1", 30.0),
        system_transfer("out-4", Some(t0 + 7260), "Target1", "HopD", 1.0),
        system_transfer("out-5", Some(t0 + 7320), "Target1", "HopE", 1.0),
        system_transfer("out-6", Some(t0 + 7380), "Target1", "HopF", 1.0),
    ];

    let analyzer = FlowAnalyzer::new();
    let result = analyzer.analyze(&txs, "Target1", &AnalysisFilters::default());

    let dispersion = result
        .patterns
        .iter()
        .find(|p| p.name == "Fund Dispersion Pattern")
        .expect("dispersion pattern should be detected");
    assert_eq!(dispersion.risk, 70);
    assert_eq!(dispersion.confidence, 85);
    assert_eq!(dispersion.evidence.len(), 8, "both rounds consumed");
    assert_eq!(dispersion.frequency, 2);

    // High-value funding first, dispersion-backed mixing last; emission
    // order is preserved, never re-sorted
    let weights: Vec<u8> = result.critical_paths.iter().map(|p| p.risk_weight).collect();
    assert_eq!(weights, vec![30, 80]);
    assert_eq!(result.critical_paths[0].evidence.len(), 2);
    assert_eq!(result.critical_paths[1].evidence.len(), 8);

    assert_eq!(result.total_inflow, 60.0);
    assert_eq!(result.total_outflow, 6.0);
}

#[test]
fn test_empty_input_yields_empty_result() {
    let analyzer = FlowAnalyzer::new();
    let result = analyzer.analyze(&[], "Target1", &AnalysisFilters::default());

    assert_eq!(result.target, "Target1");
    assert_eq!(result.risk_score, 0);
    assert!(result.nodes.is_empty());
    assert!(result.funding_sources.is_empty());
    assert!(result.patterns.is_empty());
    assert!(result.critical_paths.is_empty());
    assert_eq!(result.metrics.transaction_count, 0);
}

#[test]
fn test_outgoing_only_history_scores_thirty() {
    // No funding sources and no patterns: 20 base + 10 opacity adjustment
    let txs = vec![system_transfer(
        "out-1",
        Some(DAY_ONE_14H),
        "Target1",
        "Recipient",
        2.0,
    )];
    let analyzer = FlowAnalyzer::new();
    let result = analyzer.analyze(&txs, "Target1", &AnalysisFilters::default());

    assert!(result.funding_sources.is_empty());
    assert!(result.patterns.is_empty());
    assert_eq!(result.risk_score, 30);
}

#[test]
fn test_min_amount_filter_is_applied_before_analysis() {
    let txs = vec![
        system_transfer("big", Some(DAY_ONE_14H), "FunderX", "Target1", 10.0),
        system_transfer("small", Some(DAY_ONE_14H + 60), "FunderX", "Target1", 1.0),
    ];
    let filters = AnalysisFilters {
        min_amount: Some(5.0),
        ..Default::default()
    };

    let analyzer = FlowAnalyzer::new();
    let result = analyzer.analyze(&txs, "Target1", &filters);

    assert_eq!(result.metrics.transaction_count, 1);
    assert_eq!(result.total_inflow, 10.0);
    assert_eq!(result.funding_sources[0].tx_count, 1);
}

#[test]
fn test_analysis_is_deterministic() {
    let analyzer = FlowAnalyzer::new();
    let txs = repeated_funding_history();

    let first = analyzer.analyze(&txs, "Target1", &AnalysisFilters::default());
    let second = analyzer.analyze(&txs, "Target1", &AnalysisFilters::default());

    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.funding_sources, second.funding_sources);
    assert_eq!(first.patterns, second.patterns);
    assert_eq!(first.critical_paths, second.critical_paths);
    assert_eq!(first.timeline, second.timeline);
}

#[test]
fn test_risk_level_boundaries() {
    assert_eq!(RiskLevel::from_score(0), RiskLevel::Safe);
    assert_eq!(RiskLevel::from_score(20), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(80), RiskLevel::Critical);
}
