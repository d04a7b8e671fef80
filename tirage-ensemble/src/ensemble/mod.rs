//! Exécution concurrente des algorithmes puis fusion de leurs candidats.

pub mod combiner;
pub mod runner;

pub use combiner::{candidate_weight, combine, Aggregate, COMBINATION_METHOD};
pub use runner::{run_algorithms, RunOutcome};
