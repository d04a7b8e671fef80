use serde::{Deserialize, Serialize};

use crate::ensemble::Aggregate;
use crate::frequency::FrequencyProfile;
use crate::pattern::PatternReport;

pub const FREQUENCY_STRATEGY: &str = "Frequency Strategy";
pub const PATTERN_STRATEGY: &str = "Pattern Strategy";
pub const CONSERVATIVE_STRATEGY: &str = "Conservative Strategy";

/// Nombre minimal de numéros chauds dans l'agrégat pour proposer la stratégie fréquentielle.
const MIN_HOT_FOR_FREQUENCY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// High < 80, Medium 80..=90, Low > 90.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 80.0 {
            RiskLevel::High
        } else if confidence <= 90.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "FAIBLE"),
            RiskLevel::Medium => write!(f, "MOYEN"),
            RiskLevel::High => write!(f, "ÉLEVÉ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub mitigations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub expected_value: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayType {
    System,
    Wheel,
    Custom,
    QuickPick,
}

impl PlayType {
    /// Table de décision : le premier cas satisfait l'emporte.
    pub fn select(confidence: f64, risk: RiskLevel) -> Self {
        if confidence > 95.0 && risk == RiskLevel::Low {
            PlayType::System
        } else if confidence > 90.0 && risk == RiskLevel::Medium {
            PlayType::Wheel
        } else if confidence > 85.0 {
            PlayType::Custom
        } else {
            PlayType::QuickPick
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayType::System => "System",
            PlayType::Wheel => "Wheel",
            PlayType::Custom => "Custom",
            PlayType::QuickPick => "Quick Pick",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            PlayType::System => "Jeu système : toutes les combinaisons autour des numéros agrégés",
            PlayType::Wheel => "Réducteur : couverture partielle des numéros agrégés",
            PlayType::Custom => "Grille personnalisée : les numéros agrégés tels quels",
            PlayType::QuickPick => "Flash : engagement minimal, tirage au hasard",
        }
    }
}

impl std::fmt::Display for PlayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn assess_risk(aggregate: &Aggregate, freq: &FrequencyProfile, pattern: &PatternReport) -> RiskAssessment {
    let level = RiskLevel::from_confidence(aggregate.confidence);
    let mut factors = vec![format!("Confiance agrégée : {:.1} %", aggregate.confidence)];
    let mut mitigations = Vec::new();

    let cold: Vec<u8> = aggregate.numbers.iter().copied().filter(|&n| freq.is_cold(n)).collect();
    if !cold.is_empty() {
        factors.push(format!("{} numéro(s) froid(s) retenu(s) : {:?}", cold.len(), cold));
    }
    if freq.window_size < 50 {
        factors.push(format!("Fenêtre d'analyse courte ({} tirages)", freq.window_size));
        mitigations.push("Élargir la fenêtre ou importer plus d'historique".to_string());
    }
    if aggregate.contributing_candidates.len() < 3 {
        factors.push(format!(
            "Seulement {} algorithme(s) contributeur(s)",
            aggregate.contributing_candidates.len()
        ));
        mitigations.push("Vérifier les échecs d'algorithmes dans les logs".to_string());
    }
    if !pattern.trend_labels.is_empty() {
        factors.push(format!("Tendances : {}", pattern.trend_labels.join(", ")));
    }

    match level {
        RiskLevel::High => mitigations.push("Limiter la mise à une grille".to_string()),
        RiskLevel::Medium => mitigations.push("Répartir la mise sur plusieurs tirages".to_string()),
        RiskLevel::Low => {}
    }
    mitigations.push("Aucun modèle ne prédit un tirage équitable : jouer un montant fixe".to_string());

    RiskAssessment { level, factors, mitigations }
}

fn candidate_strategies(aggregate: &Aggregate, freq: &FrequencyProfile, pattern: &PatternReport) -> Vec<Strategy> {
    let mut strategies = Vec::new();

    let hot = aggregate.numbers.iter().filter(|&&n| freq.is_hot(n)).count();
    if hot >= MIN_HOT_FOR_FREQUENCY {
        strategies.push(Strategy {
            name: FREQUENCY_STRATEGY.to_string(),
            description: format!("{} numéros chauds dans la combinaison agrégée", hot),
            confidence: 88.0,
            expected_value: 0.12,
            risk_level: RiskLevel::Medium,
        });
    }

    if !pattern.detected_patterns.is_empty() {
        strategies.push(Strategy {
            name: PATTERN_STRATEGY.to_string(),
            description: format!("Motifs détectés : {}", pattern.detected_patterns.join(", ")),
            confidence: 82.0,
            expected_value: 0.10,
            risk_level: RiskLevel::Medium,
        });
    }

    strategies.push(Strategy {
        name: CONSERVATIVE_STRATEGY.to_string(),
        description: "Référence : mise minimale sur la combinaison agrégée".to_string(),
        confidence: 85.0,
        expected_value: 0.08,
        risk_level: RiskLevel::Low,
    });

    // Tri stable : à égalité, l'ordre d'émission est conservé
    strategies.sort_by(|a, b| {
        b.expected_value
            .partial_cmp(&a.expected_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    strategies
}

/// Évaluation du risque, stratégies classées par espérance décroissante et jeu conseillé.
pub fn build(
    aggregate: &Aggregate,
    freq: &FrequencyProfile,
    pattern: &PatternReport,
) -> (RiskAssessment, Vec<Strategy>, Strategy) {
    let risk = assess_risk(aggregate, freq, pattern);
    let strategies = candidate_strategies(aggregate, freq, pattern);

    let play = PlayType::select(aggregate.confidence, risk.level);
    // La stratégie conservatrice est toujours présente
    let expected_value = strategies.first().map(|s| s.expected_value).unwrap_or(0.0);
    let optimal_play = Strategy {
        name: play.name().to_string(),
        description: play.description().to_string(),
        confidence: aggregate.confidence,
        expected_value,
        risk_level: risk.level,
    };

    (risk, strategies, optimal_play)
}
