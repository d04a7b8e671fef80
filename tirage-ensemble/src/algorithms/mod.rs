//! Algorithmes de scoring indépendants.
//!
//! Chaque algorithme lit le même historique (jamais modifié) et produit un
//! [`Candidate`]. Ils sont enregistrés dans un [`AlgorithmRegistry`] : en
//! ajouter un ne touche ni le runner ni le combineur.

pub mod dirichlet;
pub mod ewma;
pub mod markov;
pub mod registry;
pub mod retard;
pub mod sampler;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use tirage_db::models::{validate_numbers, Draw, GameConfig, Pool};

use crate::error::AlgorithmError;

pub use registry::{default_registry, AlgorithmRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub algorithm_name: String,
    /// Triés par ordre croissant.
    pub numbers: Vec<u8>,
    pub bonus_numbers: Vec<u8>,
    /// Dans [0, 100].
    pub confidence: f64,
    /// Mesuré par le runner, pas par l'algorithme.
    pub execution_duration_ms: u64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

pub trait ScoringAlgorithm: Send + Sync {
    fn name(&self) -> &str;
    /// draws[0] = tirage le plus récent.
    fn score(&self, draws: &[Draw], config: &GameConfig) -> Result<Candidate, AlgorithmError>;
    fn params(&self) -> HashMap<String, f64> {
        HashMap::new()
    }
}

/// Vérifie le contrat de sortie d'un algorithme.
pub fn validate_candidate(candidate: &Candidate, config: &GameConfig) -> anyhow::Result<()> {
    validate_numbers(&candidate.numbers, config.number_count, config.number_range, Pool::Main)?;
    validate_numbers(&candidate.bonus_numbers, config.bonus_count, config.bonus_range, Pool::Bonus)?;
    if !candidate.confidence.is_finite() || !(0.0..=100.0).contains(&candidate.confidence) {
        anyhow::bail!("Confiance hors de [0, 100] : {}", candidate.confidence);
    }
    Ok(())
}

/// Nombre de tirages à partir duquel l'historique ne pénalise plus la confiance.
const FULL_DEPTH: usize = 50;

/// Les `count` numéros les plus probables, triés par ordre croissant.
/// À probabilité égale, le plus petit numéro gagne.
pub fn top_k(dist: &[f64], count: usize) -> Vec<u8> {
    let mut indices: Vec<usize> = (0..dist.len()).collect();
    indices.sort_by(|&a, &b| dist[b].partial_cmp(&dist[a]).unwrap_or(std::cmp::Ordering::Equal));
    let mut picked: Vec<u8> = indices.iter().take(count).map(|&i| (i + 1) as u8).collect();
    picked.sort();
    picked
}

/// Gain moyen des numéros choisis par rapport à l'uniforme (1.0 = aucun signal).
pub fn lift(dist: &[f64], picked: &[u8]) -> f64 {
    if dist.is_empty() || picked.is_empty() {
        return 1.0;
    }
    let uniform = 1.0 / dist.len() as f64;
    picked
        .iter()
        .map(|&n| dist.get((n as usize).wrapping_sub(1)).copied().unwrap_or(0.0) / uniform)
        .sum::<f64>()
        / picked.len() as f64
}

/// Confiance = base pondérée par la profondeur d'historique + bonus de concentration.
pub fn confidence_from(base: f64, history_len: usize, lift: f64) -> f64 {
    let depth = (history_len as f64 / FULL_DEPTH as f64).min(1.0);
    let concentration = 1.0 - (-(lift - 1.0).max(0.0)).exp();
    let raw = (base * depth + 10.0 * concentration).clamp(0.0, 100.0);
    (raw * 10.0).round() / 10.0
}

pub fn require_history(draws: &[Draw], needed: usize) -> Result<(), AlgorithmError> {
    if draws.len() < needed {
        return Err(AlgorithmError::InsufficientData { needed, available: draws.len() });
    }
    Ok(())
}

/// Assemble un candidat à partir des numéros choisis dans chaque pool.
pub fn build_candidate(
    algorithm: &dyn ScoringAlgorithm,
    draws: &[Draw],
    base_confidence: f64,
    main: (&[f64], Vec<u8>),
    bonus: Vec<u8>,
) -> Candidate {
    let (main_dist, numbers) = main;
    let main_lift = lift(main_dist, &numbers);

    let mut metadata: BTreeMap<String, serde_json::Value> = algorithm
        .params()
        .into_iter()
        .map(|(k, v)| (k, serde_json::json!(v)))
        .collect();
    metadata.insert("lift".to_string(), serde_json::json!(main_lift));
    metadata.insert("history".to_string(), serde_json::json!(draws.len()));

    Candidate {
        algorithm_name: algorithm.name().to_string(),
        numbers,
        bonus_numbers: bonus,
        confidence: confidence_from(base_confidence, draws.len(), main_lift),
        execution_duration_ms: 0,
        metadata,
    }
}

/// Chemin commun des algorithmes déterministes : distribution par pool puis top-k.
pub fn score_top_k<F>(
    algorithm: &dyn ScoringAlgorithm,
    draws: &[Draw],
    config: &GameConfig,
    base_confidence: f64,
    predict: F,
) -> Candidate
where
    F: Fn(Pool) -> Vec<f64>,
{
    let main_dist = predict(Pool::Main);
    let numbers = top_k(&main_dist, config.number_count);
    let bonus = if config.bonus_count > 0 {
        top_k(&predict(Pool::Bonus), config.bonus_count)
    } else {
        Vec::new()
    };
    build_candidate(algorithm, draws, base_confidence, (&main_dist, numbers), bonus)
}

pub fn validate_distribution(dist: &[f64], size: usize) -> bool {
    if dist.len() != size {
        return false;
    }
    if dist.iter().any(|&p| p < 0.0) {
        return false;
    }
    let sum: f64 = dist.iter().sum();
    (sum - 1.0).abs() < 1e-9
}

/// Normalise en place ; retombe sur l'uniforme si la masse est nulle.
pub fn normalize(scores: &mut Vec<f64>) {
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    } else if !scores.is_empty() {
        let n = scores.len();
        *scores = vec![1.0 / n as f64; n];
    }
}

pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let base = (i % 10) as u8;
            Draw {
                draw_id: format!("{:03}", n - i),
                date: start + chrono::Days::new((n - i) as u64 * 3),
                numbers: (1..=5).map(|j| (base * 5 + j).min(50)).collect(),
                bonus_numbers: vec![base % 12 + 1, (base + 1) % 12 + 1],
            }
        })
        .collect()
}

pub fn euromillions() -> GameConfig {
    GameConfig::new(5, 50, 2, 12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_distribution_valid() {
        let dist = vec![1.0 / 50.0; 50];
        assert!(validate_distribution(&dist, 50));
    }

    #[test]
    fn test_validate_distribution_wrong_size() {
        let dist = vec![1.0 / 50.0; 49];
        assert!(!validate_distribution(&dist, 50));
    }

    #[test]
    fn test_top_k_sorted_and_tie_break() {
        let dist = vec![0.1, 0.3, 0.1, 0.3, 0.2];
        assert_eq!(top_k(&dist, 2), vec![2, 4]);
        assert_eq!(top_k(&dist, 3), vec![2, 4, 5]);
        // Égalité 0.1 : le 1 passe avant le 3
        assert_eq!(top_k(&dist, 4), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence_from(80.0, 0, 1.0), 0.0);
        assert_eq!(confidence_from(80.0, 100, 1.0), 80.0);
        assert!(confidence_from(95.0, 100, 50.0) <= 100.0);
        assert!(confidence_from(80.0, 100, 2.0) > confidence_from(80.0, 100, 1.2));
        assert!(confidence_from(80.0, 25, 1.0) < confidence_from(80.0, 50, 1.0));
    }

    #[test]
    fn test_lift_uniform_is_one() {
        let dist = vec![0.25; 4];
        assert!((lift(&dist, &[1, 3]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_make_test_draws_valid() {
        let config = euromillions();
        let draws = make_test_draws(30);
        for d in &draws {
            assert!(tirage_db::models::validate_draw(d, &config).is_ok(), "{:?}", d);
        }
        assert!(draws.windows(2).all(|w| w[0].date > w[1].date));
    }

    #[test]
    fn test_validate_candidate() {
        let config = euromillions();
        let mut candidate = Candidate {
            algorithm_name: "Test".into(),
            numbers: vec![1, 2, 3, 4, 5],
            bonus_numbers: vec![1, 2],
            confidence: 80.0,
            execution_duration_ms: 0,
            metadata: BTreeMap::new(),
        };
        assert!(validate_candidate(&candidate, &config).is_ok());
        candidate.confidence = 120.0;
        assert!(validate_candidate(&candidate, &config).is_err());
        candidate.confidence = 80.0;
        candidate.numbers = vec![1, 2, 3, 4, 4];
        assert!(validate_candidate(&candidate, &config).is_err());
    }
}
