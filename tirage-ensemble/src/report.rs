use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ensemble::Aggregate;
use crate::frequency::FrequencyProfile;
use crate::pattern::PatternReport;
use crate::strategy::{RiskAssessment, Strategy};

/// Résultat complet d'une requête, figé après construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub game_id: String,
    pub aggregate: Aggregate,
    pub frequency: FrequencyProfile,
    pub pattern: PatternReport,
    pub risk: RiskAssessment,
    /// Par espérance décroissante.
    pub strategies: Vec<Strategy>,
    pub optimal_play: Strategy,
    pub generated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Vrai si l'historique provient du magasin synthétique.
    pub sandbox: bool,
}

pub struct ReportParts {
    pub aggregate: Aggregate,
    pub frequency: FrequencyProfile,
    pub pattern: PatternReport,
    pub risk: RiskAssessment,
    pub strategies: Vec<Strategy>,
    pub optimal_play: Strategy,
}

pub fn assemble(game_id: &str, parts: ReportParts, started: Instant, sandbox: bool) -> PredictionReport {
    PredictionReport {
        game_id: game_id.to_string(),
        aggregate: parts.aggregate,
        frequency: parts.frequency,
        pattern: parts.pattern,
        risk: parts.risk,
        strategies: parts.strategies,
        optimal_play: parts.optimal_play,
        generated_at: Utc::now(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        sandbox,
    }
}

pub fn to_json(report: &PredictionReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use crate::ensemble::COMBINATION_METHOD;
    use crate::strategy::{build, RiskLevel};

    fn parts() -> ReportParts {
        let aggregate = Aggregate {
            numbers: vec![7, 12, 21, 29, 35],
            bonus_numbers: vec![12],
            confidence: 92.1,
            contributing_candidates: Vec::new(),
            combination_method: COMBINATION_METHOD.to_string(),
        };
        let frequency = FrequencyProfile {
            per_number_count: BTreeMap::from([(7, 3), (12, 1)]),
            hot_numbers: vec![7],
            cold_numbers: vec![12],
            window_size: 10,
            expected_count: 0.7,
            gaps: BTreeMap::new(),
        };
        let pattern = PatternReport {
            detected_patterns: Vec::new(),
            trend_labels: vec!["odd-trending".to_string()],
            sequential_draws: 0,
            odd_ratio: 0.7,
            low_ratio: 0.5,
        };
        let (risk, strategies, optimal_play) = build(&aggregate, &frequency, &pattern);
        ReportParts { aggregate, frequency, pattern, risk, strategies, optimal_play }
    }

    #[test]
    fn test_assemble_stamps_time() {
        let started = Instant::now() - Duration::from_millis(20);
        let before = Utc::now();
        let report = assemble("powerball", parts(), started, false);

        assert!(report.generated_at >= before);
        assert!(report.elapsed_ms >= 20);
        assert_eq!(report.game_id, "powerball");
        assert_eq!(report.risk.level, RiskLevel::Low);
        assert!(!report.sandbox);
    }

    #[test]
    fn test_json_output() {
        let report = assemble("powerball", parts(), Instant::now(), true);
        let json = to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["aggregate"]["numbers"], serde_json::json!([7, 12, 21, 29, 35]));
        assert_eq!(value["risk"]["level"], "Low");
        assert_eq!(value["sandbox"], true);
        assert_eq!(value["aggregate"]["combination_method"], COMBINATION_METHOD);

        let back: PredictionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.aggregate.numbers, report.aggregate.numbers);
        assert_eq!(back.strategies.len(), report.strategies.len());
        assert_eq!(back.generated_at, report.generated_at);
    }
}
