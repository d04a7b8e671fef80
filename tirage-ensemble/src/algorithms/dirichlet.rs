use std::collections::HashMap;

use tirage_db::models::{Draw, GameConfig, Pool};

use super::{require_history, score_top_k, Candidate, ScoringAlgorithm};
use crate::error::AlgorithmError;

/// Fréquences lissées par un prior de Dirichlet symétrique.
pub struct DirichletModel {
    alpha: f64,
    window: Option<usize>,
}

impl DirichletModel {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, window: None }
    }

    pub fn with_window(alpha: f64, window: Option<usize>) -> Self {
        Self { alpha, window }
    }

    pub fn predict(&self, draws: &[Draw], config: &GameConfig, pool: Pool) -> Vec<f64> {
        let size = pool.size(config);
        let mut counts = vec![0u32; size];

        let window = self.window.unwrap_or(draws.len()).min(draws.len());
        for draw in &draws[..window] {
            for &n in pool.numbers_from(draw) {
                let idx = (n as usize).wrapping_sub(1);
                if idx < size {
                    counts[idx] += 1;
                }
            }
        }

        let total: u32 = counts.iter().sum();
        let denominator = size as f64 * self.alpha + total as f64;

        counts
            .iter()
            .map(|&count| (self.alpha + count as f64) / denominator)
            .collect()
    }
}

impl ScoringAlgorithm for DirichletModel {
    fn name(&self) -> &str {
        "Dirichlet"
    }

    fn score(&self, draws: &[Draw], config: &GameConfig) -> Result<Candidate, AlgorithmError> {
        require_history(draws, 1)?;
        Ok(score_top_k(self, draws, config, 82.0, |pool| self.predict(draws, config, pool)))
    }

    fn params(&self) -> HashMap<String, f64> {
        let mut params = HashMap::from([("alpha".to_string(), self.alpha)]);
        if let Some(w) = self.window {
            params.insert("window".to_string(), w as f64);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{euromillions, make_test_draws, validate_candidate, validate_distribution};

    #[test]
    fn test_dirichlet_main_sums_to_one() {
        let model = DirichletModel::new(1.0);
        let draws = make_test_draws(20);
        let dist = model.predict(&draws, &euromillions(), Pool::Main);
        assert!(validate_distribution(&dist, 50));
    }

    #[test]
    fn test_dirichlet_bonus_sums_to_one() {
        let model = DirichletModel::new(1.0);
        let draws = make_test_draws(20);
        let dist = model.predict(&draws, &euromillions(), Pool::Bonus);
        assert!(validate_distribution(&dist, 12));
    }

    #[test]
    fn test_dirichlet_uniform_empty() {
        let model = DirichletModel::new(1.0);
        let dist = model.predict(&[], &euromillions(), Pool::Main);
        let expected = 1.0 / 50.0;
        for &p in &dist {
            assert!((p - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_dirichlet_window_ignores_old_draws() {
        let draws = make_test_draws(20);
        // Fenêtre de 1 : seul draws[0] (1..=5) compte
        let dist = DirichletModel::with_window(0.1, Some(1)).predict(&draws, &euromillions(), Pool::Main);
        assert!(dist[0] > dist[10]);
        assert!((dist[10] - dist[49]).abs() < 1e-12);
    }

    #[test]
    fn test_dirichlet_score_picks_most_frequent() {
        let draws = make_test_draws(1);
        let candidate = DirichletModel::new(1.0).score(&draws, &euromillions()).unwrap();
        assert_eq!(candidate.numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(candidate.bonus_numbers, vec![1, 2]);
        assert!(validate_candidate(&candidate, &euromillions()).is_ok());
    }

    #[test]
    fn test_dirichlet_empty_history_fails() {
        let err = DirichletModel::new(1.0).score(&[], &euromillions()).unwrap_err();
        assert_eq!(err, AlgorithmError::InsufficientData { needed: 1, available: 0 });
    }
}
