use serde::Serialize;
use thiserror::Error;

/// Échec local d'un algorithme : il est exclu de la combinaison, la requête continue.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgorithmError {
    #[error("historique insuffisant : {needed} tirages requis, {available} disponibles")]
    InsufficientData { needed: usize, available: usize },

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Error,
    Timeout,
    Panicked,
    Cancelled,
    ContractViolation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Error => write!(f, "erreur"),
            FailureKind::Timeout => write!(f, "délai dépassé"),
            FailureKind::Panicked => write!(f, "panique"),
            FailureKind::Cancelled => write!(f, "annulé"),
            FailureKind::ContractViolation => write!(f, "contrat violé"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmFailure {
    pub algorithm: String,
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for AlgorithmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) : {}", self.algorithm, self.kind, self.message)
    }
}

fn join_failures(failures: &[AlgorithmFailure]) -> String {
    failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("Configuration invalide : {0}")]
    InvalidConfig(String),

    #[error("Historique indisponible pour '{game_id}' : {reason}")]
    HistoryUnavailable { game_id: String, reason: String },

    #[error("Aucun algorithme n'a produit de candidat ({})", join_failures(.failures))]
    NoCandidates { failures: Vec<AlgorithmFailure> },
}

pub type Result<T> = std::result::Result<T, EnsembleError>;
