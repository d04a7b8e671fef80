use std::sync::Arc;

use anyhow::bail;

use super::dirichlet::DirichletModel;
use super::ewma::EwmaModel;
use super::markov::MarkovModel;
use super::retard::RetardModel;
use super::sampler::WeightedSamplerModel;
use super::ScoringAlgorithm;

/// Ensemble ordonné d'algorithmes ; l'ordre d'enregistrement fait foi pour la combinaison.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: Vec<Arc<dyn ScoringAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse un nom déjà enregistré.
    pub fn register(&mut self, algorithm: Arc<dyn ScoringAlgorithm>) -> anyhow::Result<()> {
        let name = algorithm.name();
        if name.trim().is_empty() {
            bail!("Un algorithme doit avoir un nom");
        }
        if self.algorithms.iter().any(|a| a.name() == name) {
            bail!("Algorithme déjà enregistré : {}", name);
        }
        self.algorithms.push(algorithm);
        Ok(())
    }

    pub fn with(mut self, algorithm: impl ScoringAlgorithm + 'static) -> anyhow::Result<Self> {
        self.register(Arc::new(algorithm))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ScoringAlgorithm>> {
        self.algorithms.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.algorithms.iter().map(|a| a.name().to_string()).collect()
    }
}

pub fn default_registry(sampler_seed: u64) -> AlgorithmRegistry {
    AlgorithmRegistry {
        algorithms: vec![
            Arc::new(DirichletModel::with_window(0.1, Some(30))),
            Arc::new(EwmaModel::new(0.9)),
            Arc::new(RetardModel::new(1.5)),
            Arc::new(MarkovModel::new()),
            Arc::new(WeightedSamplerModel::new(sampler_seed)),
        ],
    }
}
