use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tirage_db::models::{GameConfig, Pool};

use crate::algorithms::{validate_candidate, Candidate};
use crate::error::{AlgorithmFailure, EnsembleError, FailureKind, Result};

pub const COMBINATION_METHOD: &str = "confidence-latency-weighted-mean";

/// Au-delà de cette durée un candidat n'a plus d'influence.
const LATENCY_CUTOFF_MS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub numbers: Vec<u8>,
    pub bonus_numbers: Vec<u8>,
    /// Arrondie au dixième.
    pub confidence: f64,
    pub contributing_candidates: Vec<Candidate>,
    pub combination_method: String,
}

/// Poids = (confiance / 100) × max(0, 1 − durée / 1000 ms).
pub fn candidate_weight(candidate: &Candidate) -> f64 {
    let confidence = (candidate.confidence / 100.0).clamp(0.0, 1.0);
    let latency = (1.0 - candidate.execution_duration_ms as f64 / LATENCY_CUTOFF_MS).max(0.0);
    confidence * latency
}

/// Poids normalisés ; si tous sont nuls, chaque candidat pèse autant.
fn normalized_weights(candidates: &[Candidate]) -> Vec<f64> {
    let raw: Vec<f64> = candidates.iter().map(candidate_weight).collect();
    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / candidates.len() as f64; candidates.len()]
    }
}

/// Moyenne pondérée, position par position, des numéros triés de chaque candidat.
fn positional_estimates(candidates: &[Candidate], weights: &[f64], pool: Pool, count: usize) -> Vec<f64> {
    let sorted: Vec<Vec<u8>> = candidates
        .iter()
        .map(|c| {
            let mut numbers = match pool {
                Pool::Main => c.numbers.clone(),
                Pool::Bonus => c.bonus_numbers.clone(),
            };
            numbers.sort();
            numbers
        })
        .collect();

    (0..count)
        .map(|i| {
            let mut sum = 0.0f64;
            let mut weight_sum = 0.0f64;
            for (numbers, &w) in sorted.iter().zip(weights) {
                if let Some(&n) = numbers.get(i) {
                    sum += w * n as f64;
                    weight_sum += w;
                }
            }
            if weight_sum > 0.0 { sum / weight_sum } else { 1.0 }
        })
        .collect()
}

/// Arrondit chaque estimation dans [1, range] puis déplace les doublons vers
/// l'entier libre le plus proche. À distance égale, le côté le plus proche de
/// l'estimation d'origine l'emporte, puis le plus petit entier.
///
/// Échoue si `range` ne contient pas assez d'entiers distincts.
pub fn repair_uniqueness(estimates: &[f64], range: u8) -> Result<Vec<u8>> {
    if estimates.len() > range as usize {
        return Err(EnsembleError::InvalidConfig(format!(
            "{} numéros distincts demandés dans 1-{}",
            estimates.len(),
            range
        )));
    }

    let range = range as i64;
    let mut used = vec![false; range as usize + 1];
    let mut result = Vec::with_capacity(estimates.len());

    for &estimate in estimates {
        let rounded = (estimate.round() as i64).clamp(1, range);
        let value = if !used[rounded as usize] {
            rounded
        } else {
            let nearest = (1..=range)
                .filter(|&v| !used[v as usize])
                .min_by(|&a, &b| {
                    (a - rounded)
                        .abs()
                        .cmp(&(b - rounded).abs())
                        .then_with(|| (a as f64 - estimate).abs().total_cmp(&(b as f64 - estimate).abs()))
                        .then_with(|| a.cmp(&b))
                })
                .ok_or_else(|| EnsembleError::InvalidConfig(format!("plus d'entier libre dans 1-{}", range)))?;
            debug!(estimate, from = rounded, to = nearest, "doublon déplacé");
            nearest
        };
        used[value as usize] = true;
        result.push(value as u8);
    }

    result.sort();
    Ok(result)
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Écarte les candidats hors contrat (numéros invalides, confiance non finie
/// ou hors [0, 100]) et rend les échecs correspondants.
fn admissible(candidates: Vec<Candidate>, config: &GameConfig) -> (Vec<Candidate>, Vec<AlgorithmFailure>) {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut rejected = Vec::new();
    for candidate in candidates {
        match validate_candidate(&candidate, config) {
            Ok(()) => kept.push(candidate),
            Err(e) => {
                warn!(algorithm = %candidate.algorithm_name, error = %e, "Candidat écarté de la combinaison");
                rejected.push(AlgorithmFailure {
                    algorithm: candidate.algorithm_name,
                    kind: FailureKind::ContractViolation,
                    message: e.to_string(),
                });
            }
        }
    }
    (kept, rejected)
}

/// Fusionne les candidats en un agrégat. Le résultat ne dépend que de l'ordre
/// de la liste, jamais de l'ordre de terminaison des tâches.
pub fn combine(candidates: Vec<Candidate>, config: &GameConfig) -> Result<Aggregate> {
    config
        .validate()
        .map_err(|e| EnsembleError::InvalidConfig(e.to_string()))?;

    let (candidates, rejected) = admissible(candidates, config);
    if candidates.is_empty() {
        return Err(EnsembleError::NoCandidates { failures: rejected });
    }

    let weights = normalized_weights(&candidates);

    let main_estimates = positional_estimates(&candidates, &weights, Pool::Main, config.number_count);
    let numbers = repair_uniqueness(&main_estimates, config.number_range)?;

    let bonus_numbers = if config.bonus_count > 0 {
        let bonus_estimates = positional_estimates(&candidates, &weights, Pool::Bonus, config.bonus_count);
        repair_uniqueness(&bonus_estimates, config.bonus_range)?
    } else {
        Vec::new()
    };

    let confidence = candidates
        .iter()
        .zip(&weights)
        .map(|(c, w)| c.confidence * w)
        .sum::<f64>();

    Ok(Aggregate {
        numbers,
        bonus_numbers,
        confidence: round_one_decimal(confidence.clamp(0.0, 100.0)),
        contributing_candidates: candidates,
        combination_method: COMBINATION_METHOD.to_string(),
    })
}
