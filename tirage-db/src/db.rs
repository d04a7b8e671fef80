use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::{parse_numbers, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    game_id       TEXT NOT NULL,
    draw_id       TEXT NOT NULL,
    date          TEXT NOT NULL,
    numbers       TEXT NOT NULL,
    bonus_numbers TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (game_id, draw_id)
);
CREATE INDEX IF NOT EXISTS idx_draws_game_date ON draws (game_id, date DESC);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("tirage.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}

pub fn insert_draw(conn: &Connection, game_id: &str, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (game_id, draw_id, date, numbers, bonus_numbers)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            game_id,
            draw.draw_id,
            draw.date.format("%Y-%m-%d").to_string(),
            join_numbers(&draw.numbers),
            join_numbers(&draw.bonus_numbers),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

type RawRow = (String, String, String, String);

fn row_to_draw((draw_id, date, numbers, bonus): RawRow) -> Result<Draw> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .with_context(|| format!("Date invalide pour le tirage {} : '{}'", draw_id, date))?;
    let numbers = parse_numbers(&numbers)
        .with_context(|| format!("Numéros illisibles pour le tirage {}", draw_id))?;
    let bonus_numbers = parse_numbers(&bonus)
        .with_context(|| format!("Bonus illisibles pour le tirage {}", draw_id))?;
    Ok(Draw { draw_id, date, numbers, bonus_numbers })
}

/// Tirages du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, game_id: &str, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, date, numbers, bonus_numbers
         FROM draws WHERE game_id = ?1 ORDER BY date DESC, draw_id DESC LIMIT ?2"
    )?;
    let rows = stmt.query_map(rusqlite::params![game_id, limit], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?.collect::<Result<Vec<RawRow>, _>>()?;
    rows.into_iter().map(row_to_draw).collect()
}

pub fn fetch_all_draws(conn: &Connection, game_id: &str) -> Result<Vec<Draw>> {
    let n = count_draws(conn, game_id)?;
    fetch_last_draws(conn, game_id, n)
}

pub fn count_draws(conn: &Connection, game_id: &str) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM draws WHERE game_id = ?1",
        [game_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(id: &str, date: &str) -> Draw {
        Draw {
            draw_id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            numbers: vec![1, 2, 3, 4, 5],
            bonus_numbers: vec![1, 2],
        }
    }

    #[test]
    fn test_insert_and_count() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(count_draws(&conn, "euromillions").unwrap(), 0);

        insert_draw(&conn, "euromillions", &test_draw("001", "2024-01-01")).unwrap();
        assert_eq!(count_draws(&conn, "euromillions").unwrap(), 1);
        assert_eq!(count_draws(&conn, "powerball").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let inserted = insert_draw(&conn, "euromillions", &test_draw("001", "2024-01-01")).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, "euromillions", &test_draw("001", "2024-01-01")).unwrap();
        assert!(!inserted);
        // Même identifiant, autre jeu : pas un doublon
        let inserted = insert_draw(&conn, "powerball", &test_draw("001", "2024-01-01")).unwrap();
        assert!(inserted);
        assert_eq!(count_draws(&conn, "euromillions").unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        insert_draw(&conn, "euromillions", &test_draw("001", "2024-01-01")).unwrap();
        insert_draw(&conn, "euromillions", &test_draw("002", "2024-01-05")).unwrap();
        insert_draw(&conn, "euromillions", &test_draw("003", "2024-01-03")).unwrap();

        let draws = fetch_last_draws(&conn, "euromillions", 10).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].draw_id, "002");
        assert_eq!(draws[1].draw_id, "003");
        assert_eq!(draws[2].draw_id, "001");

        let limited = fetch_last_draws(&conn, "euromillions", 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_numbers_roundtrip_through_text_columns() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let mut draw = test_draw("010", "2024-02-10");
        draw.numbers = vec![7, 14, 21, 28, 35, 42];
        draw.bonus_numbers = vec![];
        insert_draw(&conn, "lotto649", &draw).unwrap();

        let all = fetch_all_draws(&conn, "lotto649").unwrap();
        assert_eq!(all, vec![draw]);
    }
}
