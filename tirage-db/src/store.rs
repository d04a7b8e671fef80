//! Accès à l'historique des tirages.
//!
//! Le moteur ne connaît que le trait [`DrawStore`] ; la persistance (SQLite,
//! mémoire) reste de la responsabilité de l'appelant. Le magasin synthétique
//! est un chemin explicite réservé au mode démo : il n'est jamais utilisé en
//! repli lorsqu'un vrai magasin échoue.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;

use crate::db::{fetch_all_draws, migrate, open_db};
use crate::models::{Draw, GameConfig};

pub trait DrawStore: Send + Sync {
    fn name(&self) -> &str;
    /// Historique complet du jeu, draws[0] = tirage le plus récent.
    fn load_history(&self, game_id: &str) -> Result<Vec<Draw>>;
    /// Vrai uniquement pour un historique fabriqué (mode démo).
    fn is_synthetic(&self) -> bool {
        false
    }
}

pub struct SqliteDrawStore {
    conn: Mutex<Connection>,
}

impl SqliteDrawStore {
    pub fn new(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::new(open_db(path)?)
    }
}

impl DrawStore for SqliteDrawStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load_history(&self, game_id: &str) -> Result<Vec<Draw>> {
        let conn = self.conn.lock();
        fetch_all_draws(&conn, game_id)
            .with_context(|| format!("Lecture de l'historique '{}' impossible", game_id))
    }
}

#[derive(Default)]
pub struct MemoryDrawStore {
    draws: HashMap<String, Vec<Draw>>,
}

impl MemoryDrawStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `draws` doit déjà être ordonné du plus récent au plus ancien.
    pub fn with_game(mut self, game_id: &str, draws: Vec<Draw>) -> Self {
        self.draws.insert(game_id.to_string(), draws);
        self
    }
}

impl DrawStore for MemoryDrawStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load_history(&self, game_id: &str) -> Result<Vec<Draw>> {
        match self.draws.get(game_id) {
            Some(draws) => Ok(draws.clone()),
            None => bail!("Aucun historique pour le jeu '{}'", game_id),
        }
    }
}

/// Historique uniforme reproductible, pour la démonstration uniquement.
pub struct SyntheticDrawStore {
    games: HashMap<String, GameConfig>,
    draw_count: usize,
    seed: u64,
    anchor: NaiveDate,
}

impl SyntheticDrawStore {
    pub fn new(games: HashMap<String, GameConfig>, draw_count: usize, seed: u64, anchor: NaiveDate) -> Self {
        Self { games, draw_count, seed, anchor }
    }
}

fn sample_distinct(rng: &mut StdRng, range: u8, count: usize) -> Vec<u8> {
    let mut numbers: Vec<u8> = rand::seq::index::sample(rng, range as usize, count)
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect();
    numbers.sort();
    numbers
}

impl DrawStore for SyntheticDrawStore {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load_history(&self, game_id: &str) -> Result<Vec<Draw>> {
        let config = self
            .games
            .get(game_id)
            .with_context(|| format!("Jeu inconnu pour le mode démo : '{}'", game_id))?;
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut draws = Vec::with_capacity(self.draw_count);
        // Deux tirages par semaine, en remontant depuis l'ancre
        for i in 0..self.draw_count {
            let date = self
                .anchor
                .checked_sub_days(Days::new(i as u64 * 3 + (i as u64 % 2)))
                .context("Date synthétique hors calendrier")?;
            draws.push(Draw {
                draw_id: format!("demo-{:05}", self.draw_count - i),
                date,
                numbers: sample_distinct(&mut rng, config.number_range, config.number_count),
                bonus_numbers: sample_distinct(&mut rng, config.bonus_range, config.bonus_count),
            });
        }
        Ok(draws)
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}
