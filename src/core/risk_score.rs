//! Risk Aggregator
//! Combines funding-source counts and pattern risk/confidence into a single
//! 0-100 score, with a factor breakdown for transparency

use crate::models::types::{ActivityPattern, FundingSource, RiskLevel};
use serde::{Deserialize, Serialize};

/// Every analysis starts from this floor
const BASE_SCORE: f64 = 20.0;
/// Added when no funding source could be attributed at all
const NO_SOURCE_ADJUSTMENT: f64 = 10.0;
/// Added when the fan-in exceeds MANY_SOURCES_THRESHOLD
const MANY_SOURCES_ADJUSTMENT: f64 = 15.0;
const MANY_SOURCES_THRESHOLD: usize = 10;
/// The confidence-weighted pattern term never contributes more than this
const PATTERN_TERM_CAP: f64 = 50.0;

/// Aggregate a 0-100 risk score.
///
/// Base 20, plus 10 for zero funding sources or 15 for more than ten (the two
/// are mutually exclusive by construction), plus the confidence-weighted mean
/// pattern risk capped at 50. Rounded and clamped to [0, 100].
pub fn aggregate_risk(funding_sources: &[FundingSource], patterns: &[ActivityPattern]) -> u8 {
    let mut score = BASE_SCORE;

    if funding_sources.is_empty() {
        score += NO_SOURCE_ADJUSTMENT;
    } else if funding_sources.len() > MANY_SOURCES_THRESHOLD {
        score += MANY_SOURCES_ADJUSTMENT;
    }

    score += pattern_term(patterns);

    score.round().clamp(0.0, 100.0) as u8
}

/// Confidence-weighted mean pattern risk, capped. Zero when no patterns
/// exist, so the mean never divides by zero.
fn pattern_term(patterns: &[ActivityPattern]) -> f64 {
    if patterns.is_empty() {
        return 0.0;
    }
    let weighted: f64 = patterns
        .iter()
        .map(|p| p.risk as f64 * p.confidence as f64 / 100.0)
        .sum();
    (weighted / patterns.len() as f64).min(PATTERN_TERM_CAP)
}

/// Individual factor contributing to the aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFactor {
    pub name: String,
    pub score: u8,
    pub reason: String,
}

/// Aggregate score plus the factor breakdown and a human-readable
/// recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub total: u8,
    pub level: RiskLevel,
    pub recommendation: String,
    pub breakdown: Vec<ScoreFactor>,
}

impl RiskSummary {
    /// Build the summary for a finished analysis
    pub fn build(funding_sources: &[FundingSource], patterns: &[ActivityPattern]) -> Self {
        let mut breakdown = vec![ScoreFactor {
            name: "Base exposure".to_string(),
            score: BASE_SCORE as u8,
            reason: "Floor applied to every analyzed address".to_string(),
        }];

        if funding_sources.is_empty() {
            breakdown.push(ScoreFactor {
                name: "Funding opacity".to_string(),
                score: NO_SOURCE_ADJUSTMENT as u8,
                reason: "No funding source could be attributed".to_string(),
            });
        } else if funding_sources.len() > MANY_SOURCES_THRESHOLD {
            breakdown.push(ScoreFactor {
                name: "Funding fan-in".to_string(),
                score: MANY_SOURCES_ADJUSTMENT as u8,
                reason: format!("{} distinct funding sources", funding_sources.len()),
            });
        }

        if !patterns.is_empty() {
            let term = pattern_term(patterns);
            breakdown.push(ScoreFactor {
                name: "Activity patterns".to_string(),
                score: term.round() as u8,
                reason: format!(
                    "Confidence-weighted mean over {} detected pattern(s)",
                    patterns.len()
                ),
            });
        }

        let total = aggregate_risk(funding_sources, patterns);
        Self {
            total,
            level: RiskLevel::from_score(total),
            recommendation: Self::recommendation_for(total),
            breakdown,
        }
    }

    fn recommendation_for(score: u8) -> String {
        let level = RiskLevel::from_score(score);
        let action = match score {
            0..=19 => "No elevated indicators. Routine monitoring is enough.",
            20..=39 => "Low-grade indicators present. Review the flagged patterns.",
            40..=59 => "Multiple indicators. Manual review of critical paths recommended.",
            60..=79 => "Strong indicators. Treat flows through this address with caution.",
            _ => "Severe indicators. Escalate for investigation.",
        };
        format!("{} {} RISK - {}", level.emoji(), level.as_str(), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::PatternKind;
    use chrono::Utc;

    fn source(address: &str, amount: f64) -> FundingSource {
        FundingSource {
            address: address.to_string(),
            first_seen_signature: format!("{}_sig", address),
            first_seen: Some(Utc::now()),
            last_seen: Some(Utc::now()),
            total_amount: amount,
            tx_count: 1,
            confidence: 60,
        }
    }

    fn pattern(risk: u8, confidence: u8) -> ActivityPattern {
        ActivityPattern {
            kind: PatternKind::Behavioral { address: None },
            name: "Test Pattern".to_string(),
            description: String::new(),
            frequency: 2,
            risk,
            confidence,
            evidence: vec![],
            first_seen: None,
            last_seen: None,
        }
    }

    #[test]
    fn test_no_sources_no_patterns_scores_30() {
        assert_eq!(aggregate_risk(&[], &[]), 30);
    }

    #[test]
    fn test_some_sources_no_patterns_scores_base() {
        let sources = vec![source("a", 1.0)];
        assert_eq!(aggregate_risk(&sources, &[]), 20);
    }

    #[test]
    fn test_large_fan_in_adjustment() {
        let sources: Vec<FundingSource> =
            (0..11).map(|i| source(&format!("s{}", i), 1.0)).collect();
        assert_eq!(aggregate_risk(&sources, &[]), 35);
    }

    #[test]
    fn test_pattern_term_is_confidence_weighted_mean() {
        let sources = vec![source("a", 1.0)];
        let patterns = vec![pattern(20, 70), pattern(20, 75), pattern(30, 80)];
        // 20 + (14 + 15 + 24) / 3 = 37.67, rounded
        assert_eq!(aggregate_risk(&sources, &patterns), 38);
    }

    #[test]
    fn test_pattern_term_capped_at_50() {
        let sources = vec![source("a", 1.0)];
        let patterns = vec![pattern(100, 100); 4];
        assert_eq!(aggregate_risk(&sources, &patterns), 70);
    }

    #[test]
    fn test_score_always_in_range() {
        let sources: Vec<FundingSource> =
            (0..20).map(|i| source(&format!("s{}", i), 1.0)).collect();
        let patterns = vec![pattern(100, 100); 8];
        let score = aggregate_risk(&sources, &patterns);
        assert!(score <= 100);
    }

    #[test]
    fn test_summary_breakdown_tracks_adjustments() {
        let summary = RiskSummary::build(&[], &[pattern(70, 85)]);
        // 20 base + 10 opacity + min(50, 70 * 0.85)
        assert_eq!(summary.total, 80);
        let names: Vec<&str> = summary.breakdown.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Base exposure", "Funding opacity", "Activity patterns"]
        );
        assert!(summary.recommendation.contains("RISK"));
    }
}
