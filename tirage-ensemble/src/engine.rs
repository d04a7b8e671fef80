use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use tirage_db::models::{validate_draw, Draw, GameConfig};
use tirage_db::store::DrawStore;

use crate::algorithms::sampler::date_seed;
use crate::algorithms::{default_registry, AlgorithmRegistry};
use crate::cache::FrequencyCache;
use crate::ensemble::{combine, run_algorithms};
use crate::error::{EnsembleError, Result};
use crate::report::{assemble, PredictionReport, ReportParts};
use crate::settings::Settings;
use crate::{frequency, pattern, strategy};

/// Point d'entrée du moteur. Sans état entre deux requêtes : chaque appel
/// relit l'historique et reconstruit tout à partir du magasin.
pub struct PredictionEngine {
    registry: AlgorithmRegistry,
    settings: Settings,
    store: Arc<dyn DrawStore>,
}

impl PredictionEngine {
    pub fn new(store: Arc<dyn DrawStore>, settings: Settings) -> Self {
        let seed = settings.engine.sampler_seed.unwrap_or_else(date_seed);
        Self {
            registry: default_registry(seed),
            settings,
            store,
        }
    }

    pub fn with_registry(store: Arc<dyn DrawStore>, settings: Settings, registry: AlgorithmRegistry) -> Self {
        Self { registry, settings, store }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn game_config(&self, game_id: &str) -> Result<GameConfig> {
        let config = self
            .settings
            .games
            .get(game_id)
            .copied()
            .ok_or_else(|| EnsembleError::InvalidConfig(format!("jeu inconnu '{}'", game_id)))?;
        config
            .validate()
            .map_err(|e| EnsembleError::InvalidConfig(format!("{}: {}", game_id, e)))?;
        Ok(config)
    }

    pub async fn generate_prediction(
        &self,
        game_id: &str,
        window_size: usize,
        deadline: Duration,
    ) -> Result<PredictionReport> {
        self.run(game_id, window_size, deadline, None).await
    }

    /// Comme [`generate_prediction`](Self::generate_prediction), en réutilisant
    /// un profil de fréquence encore valide dans `cache`.
    pub async fn generate_prediction_cached(
        &self,
        game_id: &str,
        window_size: usize,
        deadline: Duration,
        cache: &FrequencyCache,
    ) -> Result<PredictionReport> {
        self.run(game_id, window_size, deadline, Some(cache)).await
    }

    fn load_history(&self, game_id: &str, config: &GameConfig) -> Result<Vec<Draw>> {
        let history = self.store.load_history(game_id).map_err(|e| {
            error!(game_id, store = self.store.name(), "Historique illisible : {:#}", e);
            EnsembleError::HistoryUnavailable {
                game_id: game_id.to_string(),
                reason: format!("{:#}", e),
            }
        })?;

        for draw in &history {
            if let Err(e) = validate_draw(draw, config) {
                error!(game_id, draw_id = %draw.draw_id, "Tirage invalide dans l'historique : {}", e);
                return Err(EnsembleError::HistoryUnavailable {
                    game_id: game_id.to_string(),
                    reason: format!("tirage {} invalide : {}", draw.draw_id, e),
                });
            }
        }
        Ok(history)
    }

    async fn run(
        &self,
        game_id: &str,
        window_size: usize,
        deadline: Duration,
        cache: Option<&FrequencyCache>,
    ) -> Result<PredictionReport> {
        let started = Instant::now();
        let deadline_at = tokio::time::Instant::now() + deadline;

        let config = self.game_config(game_id)?;
        if window_size == 0 {
            return Err(EnsembleError::InvalidConfig("la fenêtre doit contenir au moins un tirage".to_string()));
        }
        if self.registry.is_empty() {
            return Err(EnsembleError::InvalidConfig("aucun algorithme enregistré".to_string()));
        }

        info!(
            game_id,
            window_size,
            algorithms = self.registry.len(),
            deadline_ms = deadline.as_millis() as u64,
            "Prédiction demandée"
        );

        let draws: Arc<[Draw]> = self.load_history(game_id, &config)?.into();
        let analysis = &self.settings.analysis;
        let cached_frequency = cache.and_then(|c| c.get(game_id, window_size));
        let frequency_hit = cached_frequency.is_some();

        // Les algorithmes partent sur le pool bloquant ; les deux analyses
        // tournent pendant ce temps sur la tâche courante.
        let (outcome, frequency, pattern) = tokio::join!(
            run_algorithms(
                &self.registry,
                Arc::clone(&draws),
                config,
                self.settings.engine.algorithm_timeout(),
                deadline_at,
            ),
            async {
                match cached_frequency {
                    Some(profile) => profile,
                    None => frequency::analyze(&draws, &config, window_size, analysis),
                }
            },
            async { pattern::analyze(&draws, &config, window_size, analysis) },
        );

        if let Some(cache) = cache {
            if !frequency_hit {
                cache.insert(game_id, window_size, frequency.clone());
            }
        }

        if outcome.candidates.is_empty() {
            error!(game_id, failures = outcome.failures.len(), "Aucun candidat exploitable");
            return Err(EnsembleError::NoCandidates { failures: outcome.failures });
        }
        let failed = outcome.failures.len();

        let aggregate = combine(outcome.candidates, &config)?;
        let (risk, strategies, optimal_play) = strategy::build(&aggregate, &frequency, &pattern);

        let report = assemble(
            game_id,
            ReportParts { aggregate, frequency, pattern, risk, strategies, optimal_play },
            started,
            self.store.is_synthetic(),
        );

        info!(
            game_id,
            elapsed_ms = report.elapsed_ms,
            confidence = report.aggregate.confidence,
            contributors = report.aggregate.contributing_candidates.len(),
            failed,
            "Prédiction terminée"
        );
        Ok(report)
    }
}
