use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use tirage_db::store::DrawStore;
use tirage_ensemble::cache::FrequencyCache;
use tirage_ensemble::frequency;
use tirage_ensemble::PredictionEngine;

use crate::display::{display_draws, display_frequency, display_games, display_report};

/// Durée de vie des profils de fréquence entre deux commandes.
const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Predict,
    History,
    Frequency,
    Games,
    Help,
    Quit,
}

fn keyword(word: &str) -> Option<Intent> {
    match word {
        "1" | "predire" | "prédire" | "prediction" | "prédiction" | "predict" | "pred" => Some(Intent::Predict),
        "2" | "historique" | "history" | "hist" | "tirages" | "draws" => Some(Intent::History),
        "3" | "frequence" | "fréquence" | "frequences" | "fréquences" | "frequency" | "freq" | "stats" => {
            Some(Intent::Frequency)
        }
        "4" | "jeux" | "jeu" | "games" | "game" => Some(Intent::Games),
        "5" | "aide" | "help" | "h" | "?" => Some(Intent::Help),
        "6" | "quitter" | "quit" | "q" | "exit" => Some(Intent::Quit),
        _ => None,
    }
}

/// Commande exacte d'abord, puis premier mot-clé reconnu dans une phrase.
/// Les chiffres ne comptent que seuls.
pub fn classify_intent(input: &str) -> Option<Intent> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if let Some(intent) = keyword(&normalized) {
        return Some(intent);
    }
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .find_map(keyword)
}

fn display_menu(game_id: &str) {
    println!();
    println!("── Mode interactif ({}) ──", game_id);
    println!("  1. predire     Générer une prédiction");
    println!("  2. historique  Derniers tirages");
    println!("  3. frequences  Numéros chauds et froids");
    println!("  4. jeux        Changer de jeu");
    println!("  5. aide        Afficher ce menu");
    println!("  6. quitter     Quitter");
    println!();
}

pub fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        anyhow::bail!("Fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_usize(msg: &str, default: usize) -> Result<usize> {
    prompt_with_default(msg, &default.to_string())?
        .parse()
        .context("Nombre invalide")
}

struct Session {
    engine: PredictionEngine,
    store: Arc<dyn DrawStore>,
    cache: FrequencyCache,
    game_id: String,
}

impl Session {
    async fn predict(&self) -> Result<()> {
        let window = prompt_usize("Fenêtre d'analyse", self.engine.settings().engine.default_window)?;
        let deadline = self.engine.settings().engine.default_deadline();
        let report = self
            .engine
            .generate_prediction_cached(&self.game_id, window, deadline, &self.cache)
            .await?;
        display_report(&report);
        Ok(())
    }

    fn history(&self) -> Result<()> {
        let last = prompt_usize("Nombre de tirages", 10)?;
        let draws = self.store.load_history(&self.game_id)?;
        let shown = &draws[..last.min(draws.len())];
        display_draws(shown);
        Ok(())
    }

    fn frequency(&self) -> Result<()> {
        let window = prompt_usize("Fenêtre d'analyse", self.engine.settings().engine.default_window)?;
        if window == 0 {
            anyhow::bail!("La fenêtre doit contenir au moins un tirage");
        }
        let profile = match self.cache.get(&self.game_id, window) {
            Some(profile) => profile,
            None => {
                let config = self.engine.game_config(&self.game_id)?;
                let draws = self.store.load_history(&self.game_id)?;
                let profile = frequency::analyze(&draws, &config, window, &self.engine.settings().analysis);
                self.cache.insert(&self.game_id, window, profile.clone());
                debug!(game = %self.game_id, window, cached = self.cache.len(), "Profil de fréquence mis en cache");
                profile
            }
        };
        display_frequency(&profile);
        Ok(())
    }

    fn switch_game(&mut self) -> Result<()> {
        display_games(&self.engine.settings().games);
        let game_id = prompt_with_default("Jeu", &self.game_id)?;
        self.engine.game_config(&game_id)?;
        self.game_id = game_id;
        Ok(())
    }
}

pub async fn run_interactive(engine: PredictionEngine, store: Arc<dyn DrawStore>, game_id: String) -> Result<()> {
    engine.game_config(&game_id)?;
    println!("Bienvenue dans le mode interactif de tirage !");
    if store.is_synthetic() {
        println!("!! MODE DÉMO : historique synthétique !!");
    }

    let mut session = Session {
        engine,
        store,
        cache: FrequencyCache::new(CACHE_TTL),
        game_id,
    };
    display_menu(&session.game_id);

    loop {
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        let outcome = match classify_intent(&input) {
            Some(Intent::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(Intent::Predict) => session.predict().await,
            Some(Intent::History) => session.history(),
            Some(Intent::Frequency) => session.frequency(),
            Some(Intent::Games) => session.switch_game(),
            Some(Intent::Help) => {
                display_menu(&session.game_id);
                Ok(())
            }
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro (1-6) ou un nom de commande.", input);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_number() {
        assert_eq!(classify_intent("1"), Some(Intent::Predict));
        assert_eq!(classify_intent("2"), Some(Intent::History));
        assert_eq!(classify_intent("3"), Some(Intent::Frequency));
        assert_eq!(classify_intent("4"), Some(Intent::Games));
        assert_eq!(classify_intent("5"), Some(Intent::Help));
        assert_eq!(classify_intent("6"), Some(Intent::Quit));
        assert_eq!(classify_intent("7"), None);
    }

    #[test]
    fn test_classify_by_name() {
        assert_eq!(classify_intent("predire"), Some(Intent::Predict));
        assert_eq!(classify_intent("prédiction"), Some(Intent::Predict));
        assert_eq!(classify_intent("historique"), Some(Intent::History));
        assert_eq!(classify_intent("fréquences"), Some(Intent::Frequency));
        assert_eq!(classify_intent("jeux"), Some(Intent::Games));
        assert_eq!(classify_intent("aide"), Some(Intent::Help));
        assert_eq!(classify_intent("quitter"), Some(Intent::Quit));
    }

    #[test]
    fn test_classify_english_and_case() {
        assert_eq!(classify_intent("PREDICT"), Some(Intent::Predict));
        assert_eq!(classify_intent("  History "), Some(Intent::History));
        assert_eq!(classify_intent("q"), Some(Intent::Quit));
        assert_eq!(classify_intent("exit"), Some(Intent::Quit));
    }

    #[test]
    fn test_classify_sentence() {
        assert_eq!(classify_intent("je veux une prédiction"), Some(Intent::Predict));
        assert_eq!(classify_intent("show me the stats please"), Some(Intent::Frequency));
        // Un chiffre au milieu d'une phrase n'est pas une commande
        assert_eq!(classify_intent("montre 5 tirages"), Some(Intent::History));
        assert_eq!(classify_intent("bonjour 1"), None);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_intent(""), None);
        assert_eq!(classify_intent("   "), None);
        assert_eq!(classify_intent("bonjour"), None);
    }
}
