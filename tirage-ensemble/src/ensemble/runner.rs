use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::error::Elapsed;
use tracing::{debug, warn};

use tirage_db::models::{Draw, GameConfig};

use crate::algorithms::{validate_candidate, AlgorithmRegistry, Candidate};
use crate::error::{AlgorithmError, AlgorithmFailure, FailureKind};

/// Résultat d'une exécution : candidats valides et échecs, dans l'ordre du registre.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<AlgorithmFailure>,
}

type TaskResult = Result<Result<Result<Candidate, AlgorithmError>, JoinError>, Elapsed>;

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "panique sans message".to_string()
            }
        }
        Err(err) => err.to_string(),
    }
}

const DEADLINE_REACHED: &str = "échéance de la requête atteinte";

/// Échec de la tâche qui encadre l'algorithme (et non de l'algorithme lui-même).
fn orchestration_failure(name: &str, err: JoinError) -> AlgorithmFailure {
    let (kind, detail) = if err.is_panic() {
        (FailureKind::Panicked, panic_message(err))
    } else {
        (FailureKind::Cancelled, err.to_string())
    };
    AlgorithmFailure {
        algorithm: name.to_string(),
        kind,
        message: format!("tâche d'orchestration interrompue : {}", detail),
    }
}

fn classify(
    name: &str,
    result: TaskResult,
    elapsed: Duration,
    timeout: Duration,
    config: &GameConfig,
) -> Result<Candidate, AlgorithmFailure> {
    let failure = |kind, message: String| AlgorithmFailure {
        algorithm: name.to_string(),
        kind,
        message,
    };

    match result {
        Err(_) => Err(failure(FailureKind::Timeout, format!("{} ms", timeout.as_millis()))),
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(failure(FailureKind::Panicked, panic_message(join_err)))
        }
        Ok(Err(join_err)) => Err(failure(FailureKind::Cancelled, join_err.to_string())),
        Ok(Ok(Err(algo_err))) => Err(failure(FailureKind::Error, algo_err.to_string())),
        Ok(Ok(Ok(mut candidate))) => {
            if let Err(e) = validate_candidate(&candidate, config) {
                return Err(failure(FailureKind::ContractViolation, e.to_string()));
            }
            candidate.algorithm_name = name.to_string();
            candidate.execution_duration_ms = elapsed.as_millis() as u64;
            Ok(candidate)
        }
    }
}

/// Lance chaque algorithme du registre sur son propre thread bloquant.
///
/// Chaque algorithme dispose de `per_algorithm_timeout` ; au-delà de
/// `deadline`, les algorithmes encore en cours sont abandonnés et marqués
/// annulés. Un échec n'interrompt jamais les autres algorithmes.
pub async fn run_algorithms(
    registry: &AlgorithmRegistry,
    draws: Arc<[Draw]>,
    config: GameConfig,
    per_algorithm_timeout: Duration,
    deadline: tokio::time::Instant,
) -> RunOutcome {
    let names = registry.names();
    let mut pending: Vec<bool> = vec![true; names.len()];
    let mut set = JoinSet::new();
    let mut task_index: HashMap<Id, usize> = HashMap::with_capacity(names.len());

    for (index, algorithm) in registry.iter().enumerate() {
        let algorithm = Arc::clone(algorithm);
        let draws = Arc::clone(&draws);
        let handle = set.spawn(async move {
            let started = Instant::now();
            let handle = tokio::task::spawn_blocking(move || algorithm.score(&draws, &config));
            let result = tokio::time::timeout(per_algorithm_timeout, handle).await;
            (index, result, started.elapsed())
        });
        task_index.insert(handle.id(), index);
    }

    let mut candidates: Vec<(usize, Candidate)> = Vec::new();
    let mut failures: Vec<(usize, AlgorithmFailure)> = Vec::new();

    loop {
        match tokio::time::timeout_at(deadline, set.join_next_with_id()).await {
            Ok(Some(Ok((_, (index, result, elapsed))))) => {
                pending[index] = false;
                let name = &names[index];
                match classify(name, result, elapsed, per_algorithm_timeout, &config) {
                    Ok(candidate) => {
                        debug!(
                            algorithm = %name,
                            duration_ms = candidate.execution_duration_ms,
                            confidence = candidate.confidence,
                            "candidat produit"
                        );
                        candidates.push((index, candidate));
                    }
                    Err(failure) => {
                        warn!(algorithm = %name, kind = %failure.kind, "{}", failure.message);
                        failures.push((index, failure));
                    }
                }
            }
            Ok(Some(Err(join_err))) => match task_index.get(&join_err.id()).copied() {
                Some(index) => {
                    pending[index] = false;
                    let failure = orchestration_failure(&names[index], join_err);
                    warn!(algorithm = %failure.algorithm, kind = %failure.kind, "{}", failure.message);
                    failures.push((index, failure));
                }
                None => warn!("Tâche inconnue interrompue : {}", join_err),
            },
            Ok(None) => break,
            Err(_) => {
                set.abort_all();
                break;
            }
        }
    }

    for (index, still_pending) in pending.iter().enumerate() {
        if *still_pending {
            let failure = AlgorithmFailure {
                algorithm: names[index].clone(),
                kind: FailureKind::Cancelled,
                message: DEADLINE_REACHED.to_string(),
            };
            warn!(algorithm = %failure.algorithm, "{}", failure.message);
            failures.push((index, failure));
        }
    }

    candidates.sort_by_key(|(index, _)| *index);
    failures.sort_by_key(|(index, _)| *index);

    RunOutcome {
        candidates: candidates.into_iter().map(|(_, c)| c).collect(),
        failures: failures.into_iter().map(|(_, f)| f).collect(),
    }
}
