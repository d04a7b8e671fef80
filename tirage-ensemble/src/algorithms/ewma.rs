use std::collections::HashMap;

use tirage_db::models::{Draw, GameConfig, Pool};

use super::{require_history, score_top_k, Candidate, ScoringAlgorithm};
use crate::error::AlgorithmError;

/// Comptages pondérés par une décroissance exponentielle (récent = plus lourd).
pub struct EwmaModel {
    alpha: f64,
}

impl EwmaModel {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn predict(&self, draws: &[Draw], config: &GameConfig, pool: Pool) -> Vec<f64> {
        let size = pool.size(config);
        let mut scores = vec![0.0f64; size];

        let floor = self.alpha.powi(draws.len() as i32 + 1);

        for (t, draw) in draws.iter().enumerate() {
            let weight = self.alpha.powi(t as i32);
            for &n in pool.numbers_from(draw) {
                let idx = (n as usize).wrapping_sub(1);
                if idx < size {
                    scores[idx] += weight;
                }
            }
        }

        for score in &mut scores {
            if *score < floor {
                *score = floor;
            }
        }

        let total: f64 = scores.iter().sum();

        if total > 0.0 {
            scores.iter().map(|&s| s / total).collect()
        } else {
            vec![1.0 / size as f64; size]
        }
    }
}

impl ScoringAlgorithm for EwmaModel {
    fn name(&self) -> &str {
        "EWMA"
    }

    fn score(&self, draws: &[Draw], config: &GameConfig) -> Result<Candidate, AlgorithmError> {
        require_history(draws, 1)?;
        Ok(score_top_k(self, draws, config, 84.0, |pool| self.predict(draws, config, pool)))
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([("alpha".to_string(), self.alpha)])
    }
}
