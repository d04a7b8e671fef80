use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nombre maximal de numéros bonus par tirage.
pub const MAX_BONUS_COUNT: usize = 2;

/// Règles d'un jeu : k numéros dans [1, N], plus 0 à 2 numéros bonus dans [1, B].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub number_count: usize,
    pub number_range: u8,
    pub bonus_count: usize,
    pub bonus_range: u8,
}

impl GameConfig {
    pub fn new(number_count: usize, number_range: u8, bonus_count: usize, bonus_range: u8) -> Self {
        Self { number_count, number_range, bonus_count, bonus_range }
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_count == 0 {
            bail!("Le jeu doit tirer au moins un numéro");
        }
        if self.number_count > self.number_range as usize {
            bail!(
                "Impossible de tirer {} numéros distincts dans 1-{}",
                self.number_count,
                self.number_range
            );
        }
        if self.bonus_count > MAX_BONUS_COUNT {
            bail!("Au plus {} numéros bonus (reçu {})", MAX_BONUS_COUNT, self.bonus_count);
        }
        if self.bonus_count > self.bonus_range as usize {
            bail!(
                "Impossible de tirer {} bonus distincts dans 1-{}",
                self.bonus_count,
                self.bonus_range
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_id: String,
    pub date: NaiveDate,
    pub numbers: Vec<u8>,
    pub bonus_numbers: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Main,
    Bonus,
}

impl Pool {
    pub fn size(&self, config: &GameConfig) -> usize {
        match self {
            Pool::Main => config.number_range as usize,
            Pool::Bonus => config.bonus_range as usize,
        }
    }

    pub fn pick_count(&self, config: &GameConfig) -> usize {
        match self {
            Pool::Main => config.number_count,
            Pool::Bonus => config.bonus_count,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Pool::Main => &draw.numbers,
            Pool::Bonus => &draw.bonus_numbers,
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Main => write!(f, "numéros"),
            Pool::Bonus => write!(f, "bonus"),
        }
    }
}

/// Vérifie qu'une liste contient exactement `count` valeurs distinctes dans [1, range].
pub fn validate_numbers(numbers: &[u8], count: usize, range: u8, pool: Pool) -> Result<()> {
    if numbers.len() != count {
        bail!("Attendu {} {}, reçu {}", count, pool, numbers.len());
    }
    for &n in numbers {
        if n < 1 || n > range {
            bail!("{} hors limites (1-{}) : {}", pool, range, n);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("{} en double : {}", pool, numbers[i]);
            }
        }
    }
    Ok(())
}

pub fn validate_draw(draw: &Draw, config: &GameConfig) -> Result<()> {
    validate_numbers(&draw.numbers, config.number_count, config.number_range, Pool::Main)?;
    validate_numbers(&draw.bonus_numbers, config.bonus_count, config.bonus_range, Pool::Bonus)?;
    Ok(())
}

/// Parse "7 14 21" ou "7,14,21" en liste de numéros.
pub fn parse_numbers(raw: &str) -> Result<Vec<u8>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .map_err(|_| anyhow::anyhow!("Numéro invalide : '{}'", s))
        })
        .collect()
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euromillions() -> GameConfig {
        GameConfig::new(5, 50, 2, 12)
    }

    fn draw(numbers: Vec<u8>, bonus_numbers: Vec<u8>) -> Draw {
        Draw {
            draw_id: "001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            numbers,
            bonus_numbers,
        }
    }

    #[test]
    fn test_validate_config_ok() {
        assert!(euromillions().validate().is_ok());
        assert!(GameConfig::new(6, 49, 0, 0).validate().is_ok());
        assert!(GameConfig::new(5, 5, 1, 1).validate().is_ok());
    }

    #[test]
    fn test_validate_config_count_above_range() {
        assert!(GameConfig::new(6, 5, 0, 0).validate().is_err());
        assert!(GameConfig::new(0, 5, 0, 0).validate().is_err());
    }

    #[test]
    fn test_validate_config_too_many_bonus() {
        assert!(GameConfig::new(5, 50, 3, 12).validate().is_err());
        assert!(GameConfig::new(5, 50, 2, 1).validate().is_err());
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&draw(vec![1, 2, 3, 4, 5], vec![1, 2]), &euromillions()).is_ok());
        assert!(validate_draw(&draw(vec![50, 49, 48, 47, 46], vec![11, 12]), &euromillions()).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert!(validate_draw(&draw(vec![0, 2, 3, 4, 5], vec![1, 2]), &euromillions()).is_err());
        assert!(validate_draw(&draw(vec![1, 2, 3, 4, 51], vec![1, 2]), &euromillions()).is_err());
        assert!(validate_draw(&draw(vec![1, 2, 3, 4, 5], vec![1, 13]), &euromillions()).is_err());
    }

    #[test]
    fn test_validate_draw_duplicates_and_counts() {
        assert!(validate_draw(&draw(vec![1, 1, 3, 4, 5], vec![1, 2]), &euromillions()).is_err());
        assert!(validate_draw(&draw(vec![1, 2, 3, 4, 5], vec![3, 3]), &euromillions()).is_err());
        assert!(validate_draw(&draw(vec![1, 2, 3, 4], vec![1, 2]), &euromillions()).is_err());
        assert!(validate_draw(&draw(vec![1, 2, 3, 4, 5], vec![1]), &euromillions()).is_err());
    }

    #[test]
    fn test_pool_size_and_pick_count() {
        let config = GameConfig::new(5, 69, 1, 26);
        assert_eq!(Pool::Main.size(&config), 69);
        assert_eq!(Pool::Bonus.size(&config), 26);
        assert_eq!(Pool::Main.pick_count(&config), 5);
        assert_eq!(Pool::Bonus.pick_count(&config), 1);
    }

    #[test]
    fn test_pool_numbers_from() {
        let d = draw(vec![1, 2, 3, 4, 5], vec![6, 7]);
        assert_eq!(Pool::Main.numbers_from(&d), &[1, 2, 3, 4, 5]);
        assert_eq!(Pool::Bonus.numbers_from(&d), &[6, 7]);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("7 14 21").unwrap(), vec![7, 14, 21]);
        assert_eq!(parse_numbers("7,14, 21").unwrap(), vec![7, 14, 21]);
        assert!(parse_numbers("").unwrap().is_empty());
        assert!(parse_numbers("7 x").is_err());
        assert!(parse_numbers("300").is_err());
    }
}
