use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use tirage_db::models::{format_numbers, Draw, GameConfig};
use tirage_ensemble::ensemble::candidate_weight;
use tirage_ensemble::frequency::FrequencyProfile;
use tirage_ensemble::strategy::RiskLevel;
use tirage_ensemble::PredictionReport;

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_games(games: &BTreeMap<String, GameConfig>) {
    let mut table = new_table(vec!["Jeu", "Numéros", "Bonus"]);
    for (game_id, config) in games {
        let bonus = if config.bonus_count > 0 {
            format!("{} parmi {}", config.bonus_count, config.bonus_range)
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            game_id.clone(),
            format!("{} parmi {}", config.number_count, config.number_range),
            bonus,
        ]);
    }
    println!("{table}");
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Tirage", "Numéros", "Bonus"]);
    for draw in draws {
        let mut numbers = draw.numbers.clone();
        numbers.sort();
        let mut bonus = draw.bonus_numbers.clone();
        bonus.sort();
        table.add_row(vec![
            draw.date.format("%d/%m/%Y").to_string(),
            draw.draw_id.clone(),
            format_numbers(&numbers),
            format_numbers(&bonus),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_frequency(profile: &FrequencyProfile) {
    println!(
        "\n== Fréquences sur {} tirages (attendu : {:.2}) ==\n",
        profile.window_size, profile.expected_count
    );

    let mut rows: Vec<(u8, u32)> = profile.per_number_count.iter().map(|(&n, &c)| (n, c)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let mut table = new_table(vec!["Numéro", "Sorties", "Retard", "Tag"]);
    for (number, count) in rows {
        let (tag, color) = if profile.is_hot(number) {
            ("CHAUD", Color::Green)
        } else if profile.is_cold(number) {
            ("FROID", Color::Red)
        } else {
            ("—", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", number)),
            Cell::new(count),
            Cell::new(profile.gaps.get(&number).copied().unwrap_or(0)),
            Cell::new(tag).fg(color),
        ]);
    }
    println!("{table}");
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

pub fn display_report(report: &PredictionReport) {
    if report.sandbox {
        println!("\n!! MODE DÉMO : historique synthétique, résultats sans valeur !!");
    }

    let aggregate = &report.aggregate;
    println!("\n== Candidats ({}) ==\n", report.game_id);
    let mut table = new_table(vec!["Algorithme", "Numéros", "Bonus", "Confiance", "Durée", "Poids"]);
    for candidate in &aggregate.contributing_candidates {
        table.add_row(vec![
            candidate.algorithm_name.clone(),
            format_numbers(&candidate.numbers),
            format_numbers(&candidate.bonus_numbers),
            format!("{:.1}", candidate.confidence),
            format!("{} ms", candidate.execution_duration_ms),
            format!("{:.3}", candidate_weight(candidate)),
        ]);
    }
    println!("{table}");

    println!("\n== Combinaison agrégée ==\n");
    println!("  Numéros   : {}", format_numbers(&aggregate.numbers));
    if !aggregate.bonus_numbers.is_empty() {
        println!("  Bonus     : {}", format_numbers(&aggregate.bonus_numbers));
    }
    println!("  Confiance : {:.1} %", aggregate.confidence);
    println!("  Méthode   : {}", aggregate.combination_method);

    println!("\n── Analyse ──");
    let hot: Vec<String> = report.frequency.hot_numbers.iter().map(|n| n.to_string()).collect();
    let cold: Vec<String> = report.frequency.cold_numbers.iter().map(|n| n.to_string()).collect();
    println!("  Chauds   : {}", if hot.is_empty() { "—".to_string() } else { hot.join(", ") });
    println!("  Froids   : {}", if cold.is_empty() { "—".to_string() } else { cold.join(", ") });
    println!(
        "  Motifs   : {}",
        if report.pattern.detected_patterns.is_empty() {
            "—".to_string()
        } else {
            report.pattern.detected_patterns.join(", ")
        }
    );
    println!(
        "  Impairs  : {:.0} %   Bas : {:.0} %",
        report.pattern.odd_ratio * 100.0,
        report.pattern.low_ratio * 100.0
    );

    println!("\n── Risque : {} ──", report.risk.level);
    for factor in &report.risk.factors {
        println!("  - {}", factor);
    }
    for mitigation in &report.risk.mitigations {
        println!("  → {}", mitigation);
    }

    println!("\n== Stratégies ==\n");
    let mut table = new_table(vec!["Stratégie", "Description", "Confiance", "Espérance", "Risque"]);
    for strategy in &report.strategies {
        table.add_row(vec![
            Cell::new(&strategy.name),
            Cell::new(&strategy.description),
            Cell::new(format!("{:.0}", strategy.confidence)),
            Cell::new(format!("{:.2}", strategy.expected_value)),
            Cell::new(strategy.risk_level.to_string()).fg(risk_color(strategy.risk_level)),
        ]);
    }
    println!("{table}");

    let play = &report.optimal_play;
    println!(
        "\nJeu conseillé : {} ({}), confiance {:.1}, risque {}",
        play.name, play.description, play.confidence, play.risk_level
    );
    println!("Généré le {} en {} ms", report.generated_at.format("%d/%m/%Y %H:%M:%S UTC"), report.elapsed_ms);
}
