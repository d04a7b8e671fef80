use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::warn;

use tirage_db::db::insert_draw;
use tirage_db::models::{parse_numbers, validate_draw, Draw, GameConfig};
use tirage_db::rusqlite::Connection;

/// Accepte JJ/MM/AAAA ou AAAA-MM-JJ.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

/// Colonnes : identifiant ; date ; numéros ; bonus.
fn parse_record(record: &csv::StringRecord, config: &GameConfig) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let draw_id = get(0)?;
    if draw_id.is_empty() {
        bail!("Identifiant de tirage vide");
    }
    let date = parse_date(&get(1)?)?;
    let numbers = parse_numbers(&get(2)?)?;
    let bonus_numbers = if config.bonus_count > 0 {
        parse_numbers(&get(3)?)?
    } else {
        Vec::new()
    };

    let draw = Draw { draw_id, date, numbers, bonus_numbers };
    validate_draw(&draw, config)?;
    Ok(draw)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, game_id: &str, config: &GameConfig, path: &Path) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_records(conn, game_id, config, reader)
}

fn import_records<R: std::io::Read>(
    conn: &Connection,
    game_id: &str,
    config: &GameConfig,
    mut reader: csv::Reader<R>,
) -> Result<ImportResult> {
    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        let draw = match record_result
            .context("ligne illisible")
            .and_then(|record| parse_record(&record, config))
        {
            Ok(draw) => draw,
            Err(e) => {
                warn!(line, "Ligne ignorée : {:#}", e);
                result.errors += 1;
                continue;
            }
        };
        match insert_draw(&tx, game_id, &draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                warn!(line, draw_id = %draw.draw_id, "Insertion impossible : {:#}", e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tirage_db::db::{count_draws, fetch_last_draws, migrate};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn powerball() -> GameConfig {
        GameConfig::new(5, 69, 1, 26)
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        assert_eq!(parse_date("17/02/2026").unwrap(), expected);
        assert_eq!(parse_date("2026-02-17").unwrap(), expected);
        assert_eq!(parse_date(" 2026-02-17 ").unwrap(), expected);
        assert!(parse_date("17-02-2026").is_err());
        assert!(parse_date("31/02/2026").is_err());
    }

    #[test]
    fn test_import_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id;date;numeros;bonus").unwrap();
        writeln!(file, "001;06/01/2024;7 14 21 28 35;12").unwrap();
        writeln!(file, "002;2024-01-09;3 14 19 28 41;9").unwrap();
        // Doublon
        writeln!(file, "001;06/01/2024;7 14 21 28 35;12").unwrap();
        // Hors borne
        writeln!(file, "003;13/01/2024;1 2 3 4 70;1").unwrap();
        // Date illisible
        writeln!(file, "004;demain;1 2 3 4 5;1").unwrap();
        file.flush().unwrap();

        let conn = conn();
        let result = import_csv(&conn, "powerball", &powerball(), file.path()).unwrap();
        assert_eq!(
            result,
            ImportResult { total_records: 5, inserted: 2, skipped: 1, errors: 2 }
        );
        assert_eq!(count_draws(&conn, "powerball").unwrap(), 2);

        let last = fetch_last_draws(&conn, "powerball", 1).unwrap();
        assert_eq!(last[0].draw_id, "002");
        assert_eq!(last[0].numbers, vec![3, 14, 19, 28, 41]);
    }

    #[test]
    fn test_import_game_without_bonus() {
        let data = "id;date;numeros\nA1;01/03/2024;1 2 3 4 5 6\n";
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(data.as_bytes());
        let conn = conn();
        let config = GameConfig::new(6, 49, 0, 0);
        let result = import_records(&conn, "lotto649", &config, reader).unwrap();
        assert_eq!(result.inserted, 1);
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let conn = conn();
        assert!(import_csv(&conn, "powerball", &powerball(), Path::new("/nonexistent/draws.csv")).is_err());
    }
}
