use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tirage_db::models::{Draw, GameConfig, Pool};

use crate::settings::AnalysisSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyProfile {
    /// Occurrences de chaque numéro 1..=N (zéro inclus).
    pub per_number_count: BTreeMap<u8, u32>,
    /// Tri par occurrences décroissantes.
    pub hot_numbers: Vec<u8>,
    /// Tri par occurrences croissantes.
    pub cold_numbers: Vec<u8>,
    /// Nombre de tirages effectivement analysés.
    pub window_size: usize,
    pub expected_count: f64,
    /// Retard : tirages écoulés depuis la dernière sortie (= fenêtre si absent).
    pub gaps: BTreeMap<u8, u32>,
}

impl FrequencyProfile {
    pub fn is_hot(&self, number: u8) -> bool {
        self.hot_numbers.contains(&number)
    }

    pub fn is_cold(&self, number: u8) -> bool {
        self.cold_numbers.contains(&number)
    }

    pub fn count(&self, number: u8) -> u32 {
        self.per_number_count.get(&number).copied().unwrap_or(0)
    }
}

/// Fréquences des numéros principaux sur les `window_size` tirages les plus récents.
pub fn analyze(
    draws: &[Draw],
    config: &GameConfig,
    window_size: usize,
    settings: &AnalysisSettings,
) -> FrequencyProfile {
    let size = Pool::Main.size(config);
    let window = window_size.max(1).min(draws.len());

    let mut counts = vec![0u32; size];
    let mut gaps = vec![window as u32; size];

    for (t, draw) in draws.iter().take(window).enumerate() {
        for &n in Pool::Main.numbers_from(draw) {
            let idx = (n as usize).wrapping_sub(1);
            if idx < size {
                counts[idx] += 1;
                if gaps[idx] == window as u32 {
                    gaps[idx] = t as u32;
                }
            }
        }
    }

    let expected = window as f64 * config.number_count as f64 / size as f64;
    let hot_threshold = settings.hot_multiplier * expected;
    let cold_threshold = settings.cold_multiplier * expected;

    let mut hot: Vec<(u8, u32)> = Vec::new();
    let mut cold: Vec<(u8, u32)> = Vec::new();
    for (i, &count) in counts.iter().enumerate() {
        let number = (i + 1) as u8;
        if count as f64 > hot_threshold {
            hot.push((number, count));
        } else if (count as f64) < cold_threshold {
            cold.push((number, count));
        }
    }
    // Tri stable : à égalité, le plus petit numéro d'abord
    hot.sort_by(|a, b| b.1.cmp(&a.1));
    cold.sort_by(|a, b| a.1.cmp(&b.1));

    FrequencyProfile {
        per_number_count: counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((i + 1) as u8, c))
            .collect(),
        hot_numbers: hot.into_iter().map(|(n, _)| n).collect(),
        cold_numbers: cold.into_iter().map(|(n, _)| n).collect(),
        window_size: window,
        expected_count: expected,
        gaps: gaps
            .iter()
            .enumerate()
            .map(|(i, &g)| ((i + 1) as u8, g))
            .collect(),
    }
}
