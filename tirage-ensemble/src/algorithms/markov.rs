use std::collections::HashMap;

use tirage_db::models::{Draw, GameConfig, Pool};

use super::{normalize, require_history, score_top_k, Candidate, ScoringAlgorithm};
use crate::error::AlgorithmError;

/// Transitions entre tranches de numéros d'un tirage au suivant,
/// redistribuées à l'intérieur de chaque tranche par la fréquence récente.
pub struct MarkovModel {
    freq_window: usize,
}

impl MarkovModel {
    pub fn new() -> Self {
        Self { freq_window: 50 }
    }

    /// Taille d'une tranche : dizaines pour les grands pools, quartets sinon.
    fn range_size(size: usize) -> usize {
        if size > 20 { 10 } else { 4 }
    }

    pub fn predict(&self, draws: &[Draw], config: &GameConfig, pool: Pool) -> Vec<f64> {
        let size = pool.size(config);
        if draws.len() < 2 || size == 0 {
            return vec![1.0 / size.max(1) as f64; size];
        }

        let range_size = Self::range_size(size);
        let n_ranges = size.div_ceil(range_size);

        // transition[i][j] = P(tranche j au tirage suivant | tranche i présente)
        let mut transition = vec![vec![0.0f64; n_ranges]; n_ranges];
        let mut from_counts = vec![0.0f64; n_ranges];

        for t in 0..draws.len() - 1 {
            // draws[t + 1] est plus ancien que draws[t]
            let from = numbers_to_ranges(pool.numbers_from(&draws[t + 1]), range_size);
            let to = numbers_to_ranges(pool.numbers_from(&draws[t]), range_size);

            for &from_range in &from {
                if from_range < n_ranges {
                    from_counts[from_range] += 1.0;
                    for &to_range in &to {
                        if to_range < n_ranges {
                            transition[from_range][to_range] += 1.0;
                        }
                    }
                }
            }
        }

        for i in 0..n_ranges {
            if from_counts[i] > 0.0 {
                for j in 0..n_ranges {
                    transition[i][j] /= from_counts[i];
                }
            } else {
                for j in 0..n_ranges {
                    transition[i][j] = 1.0 / n_ranges as f64;
                }
            }
        }

        let latest = numbers_to_ranges(pool.numbers_from(&draws[0]), range_size);
        let mut range_probs = vec![0.0f64; n_ranges];
        for &from_range in &latest {
            if from_range < n_ranges {
                for j in 0..n_ranges {
                    range_probs[j] += transition[from_range][j];
                }
            }
        }
        normalize(&mut range_probs);

        let mut freq = vec![0u32; size];
        let window = draws.len().min(self.freq_window);
        for draw in &draws[..window] {
            for &n in pool.numbers_from(draw) {
                let idx = (n as usize).wrapping_sub(1);
                if idx < size {
                    freq[idx] += 1;
                }
            }
        }

        let mut scores: Vec<f64> = (0..size)
            .map(|i| {
                let range_idx = (i / range_size).min(n_ranges - 1);
                range_probs[range_idx] * (freq[i] as f64 + 1.0)
            })
            .collect();
        normalize(&mut scores);
        scores
    }
}

impl Default for MarkovModel {
    fn default() -> Self {
        Self::new()
    }
}

fn numbers_to_ranges(numbers: &[u8], range_size: usize) -> Vec<usize> {
    let mut ranges: Vec<usize> = numbers
        .iter()
        .filter(|&&n| n >= 1)
        .map(|&n| ((n - 1) as usize) / range_size)
        .collect();
    ranges.sort();
    ranges.dedup();
    ranges
}

impl ScoringAlgorithm for MarkovModel {
    fn name(&self) -> &str {
        "Markov"
    }

    fn score(&self, draws: &[Draw], config: &GameConfig) -> Result<Candidate, AlgorithmError> {
        require_history(draws, 2)?;
        Ok(score_top_k(self, draws, config, 80.0, |pool| self.predict(draws, config, pool)))
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([("freq_window".to_string(), self.freq_window as f64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{euromillions, make_test_draws, validate_candidate, validate_distribution};
    use tirage_db::models::GameConfig;

    #[test]
    fn test_markov_main_sums_to_one() {
        let dist = MarkovModel::new().predict(&make_test_draws(30), &euromillions(), Pool::Main);
        assert!(validate_distribution(&dist, 50),
            "Sum = {}, len = {}", dist.iter().sum::<f64>(), dist.len());
    }

    #[test]
    fn test_markov_bonus_sums_to_one() {
        let dist = MarkovModel::new().predict(&make_test_draws(30), &euromillions(), Pool::Bonus);
        assert!(validate_distribution(&dist, 12));
    }

    #[test]
    fn test_markov_uneven_range() {
        // 69 numéros : 7 tranches, la dernière incomplète
        let config = GameConfig::new(5, 69, 1, 26);
        let dist = MarkovModel::new().predict(&make_test_draws(30), &config, Pool::Main);
        assert!(validate_distribution(&dist, 69));
    }

    #[test]
    fn test_markov_needs_two_draws() {
        let err = MarkovModel::new().score(&make_test_draws(1), &euromillions()).unwrap_err();
        assert_eq!(err, AlgorithmError::InsufficientData { needed: 2, available: 1 });
    }

    #[test]
    fn test_markov_score_contract() {
        let config = euromillions();
        let candidate = MarkovModel::new().score(&make_test_draws(30), &config).unwrap();
        assert!(validate_candidate(&candidate, &config).is_ok());
    }
}
