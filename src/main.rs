use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, bail};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ekstrasim::dataset::{self, Dataset};
use ekstrasim::persist;
use ekstrasim::predict::predict_fixture;
use ekstrasim::simulate::{SimulationConfig, run_simulation};
use ekstrasim::standings::calculate_standings;
use ekstrasim::strength::calculate_all_strengths;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let csv_path = args
        .first()
        .cloned()
        .or_else(|| std::env::var("DATASET_CSV").ok())
        .map(PathBuf::from);
    let Some(csv_path) = csv_path else {
        bail!("usage: ekstrasim <season.csv> [trials] (or set DATASET_CSV)");
    };

    let trials = args
        .get(1)
        .cloned()
        .or_else(|| std::env::var("SIM_TRIALS").ok())
        .map(|v| v.parse::<u64>().context("trials must be a number"))
        .transpose()?
        .unwrap_or(20_000);
    let seed = std::env::var("SIM_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());

    let dataset = dataset::load_csv(&csv_path)?;
    print_current_table(&dataset);
    print_strength_ranking(&dataset);
    print_next_fixture_odds(&dataset);

    if dataset.fixtures.is_empty() {
        println!("Season complete, nothing left to simulate.");
        return Ok(());
    }

    let config = SimulationConfig { trials, seed };
    let cancel = AtomicBool::new(false);
    let tally = run_simulation(
        &dataset.teams,
        &dataset.results,
        &dataset.fixtures,
        &config,
        &cancel,
    )?;
    let percentages = tally.percentages();
    print_position_matrix(&dataset, &percentages, tally.league_size());

    // Persistence is best-effort; a read-only cache dir must not kill the run.
    let standings = calculate_standings(&dataset.results);
    let strengths = calculate_all_strengths(&dataset.teams, &dataset.results);
    match persist::default_db_path() {
        Some(db_path) => {
            let saved = persist::open_db(&db_path).and_then(|mut conn| {
                persist::save_snapshot(&mut conn, &standings, &strengths, &percentages)
            });
            if let Err(err) = saved {
                warn!(error = %err, "snapshot not saved");
            }
        }
        None => warn!("no cache directory available, snapshot not saved"),
    }
    if let Ok(json_path) = std::env::var("SNAPSHOT_JSON") {
        if let Err(err) =
            persist::save_json_snapshot(&PathBuf::from(json_path), &strengths, &percentages)
        {
            warn!(error = %err, "json snapshot not saved");
        }
    }

    Ok(())
}

fn print_current_table(dataset: &Dataset) {
    let standings = calculate_standings(&dataset.results);
    if standings.is_empty() {
        println!("No finished matches yet.");
        return;
    }

    println!("Current table");
    println!(
        "{:>3}  {:<24} {:>2} {:>2} {:>2} {:>2} {:>4} {:>4} {:>4} {:>3}",
        "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for entry in &standings {
        let name = dataset
            .teams
            .iter()
            .find(|t| t.code == entry.team_code)
            .map(|t| t.name.as_str())
            .unwrap_or(entry.team_name.as_str());
        println!(
            "{:>3}  {:<24} {:>2} {:>2} {:>2} {:>2} {:>4} {:>4} {:>+4} {:>3}",
            entry.position,
            name,
            entry.played,
            entry.won,
            entry.drawn,
            entry.lost,
            entry.goals_for,
            entry.goals_against,
            entry.goal_difference,
            entry.points,
        );
    }
    println!();
}

fn print_strength_ranking(dataset: &Dataset) {
    let strengths = calculate_all_strengths(&dataset.teams, &dataset.results);
    let mut ranked: Vec<(&String, &f64)> = strengths.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("Strength ranking");
    for (code, strength) in ranked {
        let name = dataset
            .teams
            .iter()
            .find(|t| &t.code == code)
            .map(|t| t.name.as_str())
            .unwrap_or(code.as_str());
        println!("  {name:<24} {strength:.3}");
    }
    println!();
}

fn print_next_fixture_odds(dataset: &Dataset) {
    let Some(next) = dataset.fixtures.first() else {
        return;
    };
    let strengths = calculate_all_strengths(&dataset.teams, &dataset.results);
    let p = predict_fixture(&strengths, next, None);
    println!(
        "Next fixture: {} vs {}  1 {:.1}%  X {:.1}%  2 {:.1}%",
        next.home_team,
        next.away_team,
        p.home_win * 100.0,
        p.draw * 100.0,
        p.away_win * 100.0
    );
    println!();
}

fn print_position_matrix(
    dataset: &Dataset,
    percentages: &std::collections::HashMap<String, Vec<f64>>,
    league_size: usize,
) {
    if percentages.is_empty() {
        println!("Simulation produced no completed trials.");
        return;
    }

    // Rows ordered by expected finishing position, best first.
    let mut rows: Vec<(&String, &Vec<f64>)> = percentages.iter().collect();
    let expected = |pct: &[f64]| -> f64 {
        pct.iter()
            .enumerate()
            .map(|(i, p)| (i + 1) as f64 * p)
            .sum()
    };
    rows.sort_by(|a, b| expected(a.1).total_cmp(&expected(b.1)).then_with(|| a.0.cmp(b.0)));

    println!("Final position probabilities (%)");
    print!("{:<24}", "Team");
    for pos in 1..=league_size {
        print!("{pos:>6}");
    }
    println!();
    for (code, pct) in rows {
        let name = dataset
            .teams
            .iter()
            .find(|t| &t.code == code)
            .map(|t| t.name.as_str())
            .unwrap_or(code.as_str());
        print!("{name:<24}");
        for value in pct {
            print!("{value:>6.1}");
        }
        println!();
    }
}
