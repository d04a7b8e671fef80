use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tirage_db::models::GameConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Délai individuel accordé à chaque algorithme.
    pub algorithm_timeout_ms: u64,
    /// Échéance globale d'une requête quand l'appelant n'en fournit pas.
    pub default_deadline_ms: u64,
    pub default_window: usize,
    /// Seed de l'algorithme stochastique (défaut : date du jour).
    pub sampler_seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            algorithm_timeout_ms: 2000,
            default_deadline_ms: 5000,
            default_window: 100,
            sampler_seed: None,
        }
    }
}

impl EngineSettings {
    pub fn algorithm_timeout(&self) -> Duration {
        Duration::from_millis(self.algorithm_timeout_ms)
    }

    pub fn default_deadline(&self) -> Duration {
        Duration::from_millis(self.default_deadline_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub hot_multiplier: f64,
    pub cold_multiplier: f64,
    pub trend_threshold: f64,
    pub min_sequence_len: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            hot_multiplier: 1.5,
            cold_multiplier: 0.5,
            trend_threshold: 0.6,
            min_sequence_len: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub analysis: AnalysisSettings,
    pub games: BTreeMap<String, GameConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            analysis: AnalysisSettings::default(),
            games: default_games(),
        }
    }
}

pub fn default_games() -> BTreeMap<String, GameConfig> {
    BTreeMap::from([
        ("euromillions".to_string(), GameConfig::new(5, 50, 2, 12)),
        ("powerball".to_string(), GameConfig::new(5, 69, 1, 26)),
        ("megamillions".to_string(), GameConfig::new(5, 70, 1, 25)),
        ("loto".to_string(), GameConfig::new(5, 49, 1, 10)),
        ("lotto649".to_string(), GameConfig::new(6, 49, 0, 0)),
    ])
}

pub fn save_settings(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let settings: Settings = serde_json::from_str(&json)
        .with_context(|| format!("Fichier de configuration invalide {:?}", path))?;
    for (game_id, config) in &settings.games {
        config
            .validate()
            .with_context(|| format!("Jeu '{}' mal configuré", game_id))?;
    }
    Ok(settings)
}
