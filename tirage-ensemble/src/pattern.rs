use serde::{Deserialize, Serialize};

use tirage_db::models::{Draw, GameConfig, Pool};

use crate::settings::AnalysisSettings;

pub const SEQUENTIAL_PATTERN: &str = "sequential pattern";
pub const ODD_TRENDING: &str = "odd-trending";
pub const EVEN_TRENDING: &str = "even-trending";
pub const LOW_TRENDING: &str = "low-trending";
pub const HIGH_TRENDING: &str = "high-trending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub detected_patterns: Vec<String>,
    pub trend_labels: Vec<String>,
    /// Tirages de la fenêtre contenant une suite de numéros consécutifs.
    pub sequential_draws: usize,
    pub odd_ratio: f64,
    pub low_ratio: f64,
}

/// Plus longue suite d'entiers consécutifs dans un tirage.
fn longest_run(numbers: &[u8]) -> usize {
    let mut sorted = numbers.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut best = 0usize;
    let mut current = 0usize;
    for i in 0..sorted.len() {
        if i > 0 && sorted[i] == sorted[i - 1] + 1 {
            current += 1;
        } else {
            current = 1;
        }
        best = best.max(current);
    }
    best
}

pub fn analyze(
    draws: &[Draw],
    config: &GameConfig,
    window_size: usize,
    settings: &AnalysisSettings,
) -> PatternReport {
    let window = &draws[..window_size.max(1).min(draws.len())];
    let range = config.number_range as usize;

    let sequential_draws = window
        .iter()
        .filter(|d| longest_run(Pool::Main.numbers_from(d)) >= settings.min_sequence_len)
        .count();

    let mut total = 0usize;
    let mut odd = 0usize;
    let mut low = 0usize;
    for draw in window {
        for &n in Pool::Main.numbers_from(draw) {
            total += 1;
            if n % 2 == 1 {
                odd += 1;
            }
            if (n as usize) * 2 <= range {
                low += 1;
            }
        }
    }

    let ratio = |part: usize| if total > 0 { part as f64 / total as f64 } else { 0.5 };
    let (odd_ratio, even_ratio) = (ratio(odd), ratio(total - odd));
    let (low_ratio, high_ratio) = (ratio(low), ratio(total - low));

    let mut detected_patterns = Vec::new();
    if sequential_draws > 0 {
        detected_patterns.push(SEQUENTIAL_PATTERN.to_string());
    }

    let threshold = settings.trend_threshold;
    let mut trend_labels = Vec::new();
    if odd_ratio > threshold {
        trend_labels.push(ODD_TRENDING.to_string());
    } else if even_ratio > threshold {
        trend_labels.push(EVEN_TRENDING.to_string());
    }
    if low_ratio > threshold {
        trend_labels.push(LOW_TRENDING.to_string());
    } else if high_ratio > threshold {
        trend_labels.push(HIGH_TRENDING.to_string());
    }

    PatternReport {
        detected_patterns,
        trend_labels,
        sequential_draws,
        odd_ratio,
        low_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> GameConfig {
        GameConfig::new(5, 50, 0, 0)
    }

    fn draw(numbers: &[u8]) -> Draw {
        Draw {
            draw_id: "x".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            numbers: numbers.to_vec(),
            bonus_numbers: vec![],
        }
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run(&[10, 3, 4, 5, 20]), 3);
        assert_eq!(longest_run(&[1, 3, 5, 7, 9]), 1);
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(longest_run(&[44, 45, 46, 47, 1]), 4);
    }

    #[test]
    fn test_sequential_pattern_detected() {
        let draws = vec![draw(&[2, 11, 24, 37, 48]), draw(&[7, 8, 9, 30, 41])];
        let report = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert_eq!(report.detected_patterns, vec![SEQUENTIAL_PATTERN.to_string()]);
        assert_eq!(report.sequential_draws, 1);
    }

    #[test]
    fn test_pair_is_not_a_sequence() {
        let draws = vec![draw(&[7, 8, 20, 30, 41])];
        let report = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert!(report.detected_patterns.is_empty());
    }

    #[test]
    fn test_odd_and_low_trending() {
        let draws = vec![draw(&[1, 3, 5, 7, 40]), draw(&[9, 11, 13, 2, 15])];
        let report = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert!((report.odd_ratio - 0.8).abs() < 1e-12);
        assert!((report.low_ratio - 0.9).abs() < 1e-12);
        assert_eq!(report.trend_labels, vec![ODD_TRENDING.to_string(), LOW_TRENDING.to_string()]);
    }

    #[test]
    fn test_even_and_high_trending() {
        let draws = vec![draw(&[30, 32, 34, 36, 49])];
        let report = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert_eq!(report.trend_labels, vec![EVEN_TRENDING.to_string(), HIGH_TRENDING.to_string()]);
    }

    #[test]
    fn test_balanced_has_no_trend() {
        let draws = vec![draw(&[1, 2, 30, 31, 47]), draw(&[4, 5, 26, 40, 44])];
        let report = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert!(report.trend_labels.is_empty(), "{:?}", report.trend_labels);
    }

    #[test]
    fn test_empty_history() {
        let report = analyze(&[], &config(), 10, &AnalysisSettings::default());
        assert!(report.detected_patterns.is_empty());
        assert!(report.trend_labels.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let draws = vec![draw(&[1, 2, 3, 30, 31]), draw(&[4, 5, 26, 40, 44])];
        let a = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        let b = analyze(&draws, &config(), 10, &AnalysisSettings::default());
        assert_eq!(a, b);
    }
}
