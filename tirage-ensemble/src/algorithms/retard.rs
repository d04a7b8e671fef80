use std::collections::HashMap;

use tirage_db::models::{Draw, GameConfig, Pool};

use super::{normalize, require_history, score_top_k, Candidate, ScoringAlgorithm};
use crate::error::AlgorithmError;

/// Favorise les numéros en retard : (retard actuel / retard moyen)^gamma.
pub struct RetardModel {
    gamma: f64,
}

impl RetardModel {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    pub fn predict(&self, draws: &[Draw], config: &GameConfig, pool: Pool) -> Vec<f64> {
        let size = pool.size(config);
        if draws.is_empty() || size == 0 {
            return vec![1.0 / size.max(1) as f64; size];
        }

        // Retard actuel de chaque numéro
        let mut gaps = vec![draws.len(); size];
        for (t, draw) in draws.iter().enumerate() {
            for &n in pool.numbers_from(draw) {
                let idx = (n as usize).wrapping_sub(1);
                if idx < size && gaps[idx] == draws.len() {
                    gaps[idx] = t;
                }
            }
        }

        // Retard moyen entre deux sorties
        let theoretical = size as f64 / pool.pick_count(config).max(1) as f64;
        let mut mean_gaps = vec![theoretical; size];
        for (i, mean_gap) in mean_gaps.iter_mut().enumerate() {
            let number = (i + 1) as u8;
            let mut gap_sum = 0.0f64;
            let mut gap_count = 0usize;
            let mut last_seen: Option<usize> = None;

            for (t, draw) in draws.iter().enumerate() {
                if pool.numbers_from(draw).contains(&number) {
                    if let Some(prev) = last_seen {
                        gap_sum += (t - prev) as f64;
                        gap_count += 1;
                    }
                    last_seen = Some(t);
                }
            }

            if gap_count > 0 {
                *mean_gap = gap_sum / gap_count as f64;
            }
        }

        let mut scores: Vec<f64> = (0..size)
            .map(|i| {
                let ratio = (gaps[i] as f64 + 1.0) / mean_gaps[i].max(1.0);
                ratio.powf(self.gamma)
            })
            .collect();
        normalize(&mut scores);
        scores
    }
}

impl ScoringAlgorithm for RetardModel {
    fn name(&self) -> &str {
        "Retard"
    }

    fn score(&self, draws: &[Draw], config: &GameConfig) -> Result<Candidate, AlgorithmError> {
        require_history(draws, 1)?;
        Ok(score_top_k(self, draws, config, 78.0, |pool| self.predict(draws, config, pool)))
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([("gamma".to_string(), self.gamma)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{euromillions, make_test_draws, validate_candidate, validate_distribution};

    #[test]
    fn test_retard_main_sums_to_one() {
        let dist = RetardModel::new(1.5).predict(&make_test_draws(30), &euromillions(), Pool::Main);
        assert!(validate_distribution(&dist, 50),
            "Sum = {}, len = {}", dist.iter().sum::<f64>(), dist.len());
    }

    #[test]
    fn test_retard_bonus_sums_to_one() {
        let dist = RetardModel::new(1.5).predict(&make_test_draws(30), &euromillions(), Pool::Bonus);
        assert!(validate_distribution(&dist, 12));
    }

    #[test]
    fn test_retard_avoids_latest_draw() {
        let draws = make_test_draws(30);
        let config = euromillions();
        let candidate = RetardModel::new(1.5).score(&draws, &config).unwrap();
        assert!(validate_candidate(&candidate, &config).is_ok());
        for n in &draws[0].numbers {
            assert!(!candidate.numbers.contains(n), "{} vient de sortir", n);
        }
    }
}
