//! Ensemble multi-algorithmes de prédiction de tirages.
//!
//! Historique → {fréquences, motifs} et → algorithmes (concurrents) →
//! combinaison → stratégies → rapport.

pub mod algorithms;
pub mod cache;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod frequency;
pub mod pattern;
pub mod report;
pub mod settings;
pub mod strategy;

pub use engine::PredictionEngine;
pub use error::{EnsembleError, Result};
pub use report::PredictionReport;
