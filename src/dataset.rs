use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::{MatchFixture, MatchResult, MatchStats, Team, team_code};

/// Parsed season export: the roster plus finished results and remaining
/// fixtures, all keyed by normalized team codes.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub teams: Vec<Team>,
    pub results: Vec<MatchResult>,
    pub fixtures: Vec<MatchFixture>,
}

pub fn load_csv(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read season csv {}", path.display()))?;
    let dataset = parse_csv(&raw)?;
    info!(
        teams = dataset.teams.len(),
        results = dataset.results.len(),
        fixtures = dataset.fixtures.len(),
        "loaded season dataset"
    );
    Ok(dataset)
}

/// Parse the season export CSV. One row per match, finished and upcoming
/// mixed; header-driven column lookup, rows shorter than the header are
/// skipped, unparseable cells become `None` rather than errors.
pub fn parse_csv(raw: &str) -> Result<Dataset> {
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        bail!("empty season csv");
    };
    let header = split_row(header_line);

    let mut teams: BTreeMap<String, Team> = BTreeMap::new();
    let mut results = Vec::new();
    let mut fixtures = Vec::new();

    for line in lines {
        let row = split_row(line);
        if row.len() < header.len() {
            continue;
        }

        let match_id = field(&header, &row, "matchId").map(str::to_string);
        let round = field(&header, &row, "round").and_then(|v| v.parse::<u32>().ok());
        let home_name = field(&header, &row, "homeName").unwrap_or_default();
        let away_name = field(&header, &row, "awayName").unwrap_or_default();
        let home_code = team_code(home_name);
        let away_code = team_code(away_name);

        if !home_code.is_empty() {
            teams
                .entry(home_code.clone())
                .or_insert_with(|| Team::from_name(home_name));
        }
        if !away_code.is_empty() {
            teams
                .entry(away_code.clone())
                .or_insert_with(|| Team::from_name(away_name));
        }

        let kickoff = field(&header, &row, "utcTime")
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let finished = field(&header, &row, "finished")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if finished {
            let (home_goals, away_goals) = field(&header, &row, "scoreStr")
                .map(parse_score)
                .unwrap_or((None, None));
            results.push(MatchResult {
                match_id,
                finished,
                home_team: home_code,
                away_team: away_code,
                home_goals,
                away_goals,
                home_stats: Some(parse_stats(&header, &row, "__home")),
                away_stats: Some(parse_stats(&header, &row, "__away")),
            });
        } else {
            fixtures.push(MatchFixture {
                match_id,
                round,
                home_team: home_code,
                away_team: away_code,
                kickoff,
            });
        }
    }

    Ok(Dataset {
        teams: teams.into_values().collect(),
        results,
        fixtures,
    })
}

fn parse_stats(header: &[String], row: &[String], suffix: &str) -> MatchStats {
    let f64_col = |name: &str| {
        field(header, row, &format!("{name}{suffix}")).and_then(|v| v.parse::<f64>().ok())
    };
    let u32_col = |name: &str| {
        field(header, row, &format!("{name}{suffix}")).and_then(|v| v.parse::<u32>().ok())
    };

    MatchStats {
        // "BallPossesion" is misspelled in the export itself.
        ball_possession: f64_col("BallPossesion"),
        expected_goals: f64_col("expected_goals"),
        shots_on_target: u32_col("ShotsOnTarget"),
        total_shots: u32_col("total_shots"),
        passes: u32_col("passes"),
        tackles: u32_col("matchstats.headers.tackles"),
        interceptions: u32_col("interceptions"),
        keeper_saves: u32_col("keeper_saves"),
        yellow_cards: u32_col("yellow_cards"),
        red_cards: u32_col("red_cards"),
    }
}

/// "2-1" → (Some(2), Some(1)); anything else degrades to `None` sides.
fn parse_score(raw: &str) -> (Option<u32>, Option<u32>) {
    let Some((home, away)) = raw.split_once('-') else {
        return (None, None);
    };
    (
        home.trim().parse::<u32>().ok(),
        away.trim().parse::<u32>().ok(),
    )
}

fn field<'a>(header: &[String], row: &'a [String], name: &str) -> Option<&'a str> {
    let idx = header.iter().position(|h| h == name)?;
    let value = row.get(idx)?.trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Minimal quote-aware CSV field splitter; the export never embeds
/// newlines inside fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
