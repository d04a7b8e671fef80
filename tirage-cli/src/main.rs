mod display;
mod import;
mod interactive;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tirage_db::db::{count_draws, db_path, fetch_last_draws, insert_draw, migrate, open_db};
use tirage_db::models::{format_numbers, parse_numbers, validate_draw, Draw};
use tirage_db::rusqlite::Connection;
use tirage_db::store::{DrawStore, SqliteDrawStore, SyntheticDrawStore};
use tirage_ensemble::frequency;
use tirage_ensemble::report::to_json;
use tirage_ensemble::settings::{load_settings, save_settings, Settings};
use tirage_ensemble::PredictionEngine;

use crate::display::{display_draws, display_frequency, display_games, display_import_summary, display_report};
use crate::interactive::prompt;

/// Taille de l'historique fabriqué en mode démo.
const DEMO_DRAWS: usize = 300;
const DEMO_SEED: u64 = 20240101;
/// Délai laissé aux threads d'algorithmes encore actifs avant de quitter.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "tirage", about = "Ensemble multi-algorithmes de prédiction de tirages")]
struct Cli {
    /// Fichier de configuration JSON (valeurs par défaut s'il est absent)
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,

    /// Base SQLite (défaut : data/tirage.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lister les jeux configurés
    Games,

    /// Écrire la configuration courante dans le fichier --settings
    InitSettings,

    /// Importer des tirages depuis un fichier CSV (id;date;numéros;bonus)
    Import {
        #[arg(short, long)]
        game: String,

        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Lister les derniers tirages
    History {
        #[arg(short, long, default_value = "euromillions")]
        game: String,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Numéros chauds et froids
    Frequency {
        #[arg(short, long, default_value = "euromillions")]
        game: String,

        /// Fenêtre d'analyse (défaut : configuration)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Ajouter un tirage manuellement
    Add {
        #[arg(short, long, default_value = "euromillions")]
        game: String,
    },

    /// Générer une prédiction d'ensemble
    Predict {
        #[arg(short, long, default_value = "euromillions")]
        game: String,

        /// Fenêtre d'analyse (défaut : configuration)
        #[arg(short, long)]
        window: Option<usize>,

        /// Échéance globale de la requête en millisecondes
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Sortie JSON du rapport complet
        #[arg(long)]
        json: bool,

        /// Historique synthétique au lieu de la base
        #[arg(long)]
        demo: bool,
    },

    /// Mode interactif
    Interactive {
        #[arg(short, long, default_value = "euromillions")]
        game: String,

        /// Historique synthétique au lieu de la base
        #[arg(long)]
        demo: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_or_default(path: &Path) -> Result<Settings> {
    if path.exists() {
        load_settings(path)
    } else {
        debug!(?path, "Pas de fichier de configuration, valeurs par défaut");
        Ok(Settings::default())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new().context("Démarrage du runtime tokio impossible")?;
    let result = runtime.block_on(run(cli));
    shutdown(runtime);
    result
}

/// Un algorithme bloqué au-delà de l'échéance ne retient pas le processus.
fn shutdown(runtime: tokio::runtime::Runtime) {
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_or_default(&cli.settings)?;
    let path = cli.db.clone().unwrap_or_else(db_path);

    match cli.command {
        Command::Games => {
            display_games(&settings.games);
            Ok(())
        }
        Command::InitSettings => {
            save_settings(&settings, &cli.settings)?;
            println!("Configuration écrite dans {}", cli.settings.display());
            Ok(())
        }
        Command::Import { game, file } => cmd_import(&open(&path)?, &settings, &game, &file),
        Command::History { game, last } => cmd_history(&open(&path)?, &game, last),
        Command::Frequency { game, window } => cmd_frequency(&open(&path)?, &settings, &game, window),
        Command::Add { game } => cmd_add(&open(&path)?, &settings, &game),
        Command::Predict { game, window, deadline_ms, json, demo } => {
            let store = open_store(&path, &settings, demo)?;
            cmd_predict(store, settings, &game, window, deadline_ms, json).await
        }
        Command::Interactive { game, demo } => {
            let store = open_store(&path, &settings, demo)?;
            let engine = PredictionEngine::new(Arc::clone(&store), settings);
            interactive::run_interactive(engine, store, game).await
        }
    }
}

fn open(path: &Path) -> Result<Connection> {
    let conn = open_db(path)?;
    migrate(&conn)?;
    Ok(conn)
}

fn open_store(path: &Path, settings: &Settings, demo: bool) -> Result<Arc<dyn DrawStore>> {
    if demo {
        let games: HashMap<_, _> = settings.games.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let today = chrono::Local::now().date_naive();
        return Ok(Arc::new(SyntheticDrawStore::new(games, DEMO_DRAWS, DEMO_SEED, today)));
    }
    Ok(Arc::new(SqliteDrawStore::open(path)?))
}

fn game_config(settings: &Settings, game: &str) -> Result<tirage_db::models::GameConfig> {
    settings
        .games
        .get(game)
        .copied()
        .with_context(|| format!("Jeu inconnu : '{}' (voir : tirage games)", game))
}

fn cmd_import(conn: &Connection, settings: &Settings, game: &str, file: &Path) -> Result<()> {
    let config = game_config(settings, game)?;
    let result = import::import_csv(conn, game, &config, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_history(conn: &Connection, game: &str, last: u32) -> Result<()> {
    if count_draws(conn, game)? == 0 {
        println!("Aucun tirage pour '{}'. Lancez d'abord : tirage import --game {} --file <csv>", game, game);
        return Ok(());
    }
    let draws = fetch_last_draws(conn, game, last)?;
    display_draws(&draws);
    Ok(())
}

/// Fenêtre demandée (ou celle de la configuration) et nombre de tirages à lire.
fn frequency_window(requested: Option<usize>, default: usize, available: u32) -> Result<(usize, u32)> {
    let window = requested.unwrap_or(default);
    if window == 0 {
        bail!("La fenêtre doit contenir au moins un tirage");
    }
    let limit = u32::try_from(window.min(available as usize)).context("Fenêtre trop grande")?;
    Ok((window, limit))
}

fn cmd_frequency(conn: &Connection, settings: &Settings, game: &str, window: Option<usize>) -> Result<()> {
    let config = game_config(settings, game)?;
    let n = count_draws(conn, game)?;
    let (window, limit) = frequency_window(window, settings.engine.default_window, n)?;
    if n == 0 {
        println!("Aucun tirage pour '{}'. Lancez d'abord : tirage import --game {} --file <csv>", game, game);
        return Ok(());
    }
    let draws = fetch_last_draws(conn, game, limit)?;
    let profile = frequency::analyze(&draws, &config, window, &settings.analysis);
    display_frequency(&profile);
    Ok(())
}

async fn cmd_predict(
    store: Arc<dyn DrawStore>,
    settings: Settings,
    game: &str,
    window: Option<usize>,
    deadline_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let window = window.unwrap_or(settings.engine.default_window);
    let deadline = deadline_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.engine.default_deadline());
    let engine = PredictionEngine::new(store, settings);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("{} algorithmes sur '{}'...", engine.registry().len(), game));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = engine.generate_prediction(game, window, deadline).await;
    pb.finish_and_clear();
    let report = result?;

    if json {
        println!("{}", to_json(&report)?);
    } else {
        display_report(&report);
    }
    Ok(())
}

fn cmd_add(conn: &Connection, settings: &Settings, game: &str) -> Result<()> {
    let config = game_config(settings, game)?;
    println!("Ajout d'un tirage manuellement ({})\n", game);

    let draw_id = prompt("Identifiant du tirage (ex: 26014) : ")?;
    let date = import::parse_date(&prompt("Date (JJ/MM/AAAA) : ")?)?;

    let numbers = loop {
        let input = prompt(&format!(
            "{} numéros (séparés par des espaces, 1-{}) : ",
            config.number_count, config.number_range
        ))?;
        match parse_numbers(&input) {
            Ok(v) => break v,
            Err(e) => println!("{e}. Réessayez."),
        }
    };
    let bonus_numbers = if config.bonus_count > 0 {
        loop {
            let input = prompt(&format!(
                "{} bonus (séparés par des espaces, 1-{}) : ",
                config.bonus_count, config.bonus_range
            ))?;
            match parse_numbers(&input) {
                Ok(v) => break v,
                Err(e) => println!("{e}. Réessayez."),
            }
        }
    } else {
        Vec::new()
    };

    let draw = Draw { draw_id, date, numbers, bonus_numbers };
    validate_draw(&draw, &config)?;

    println!("\nTirage à insérer :");
    println!(
        "  Numéros: {}  Bonus: {}",
        format_numbers(&draw.numbers),
        format_numbers(&draw.bonus_numbers)
    );

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_draw(conn, game, &draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}
