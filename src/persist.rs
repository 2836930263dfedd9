use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::standings::StandingsEntry;

const CACHE_DIR: &str = "ekstrasim";
const DB_FILE: &str = "snapshots.sqlite";
const JSON_SNAPSHOT_VERSION: u32 = 1;

// How many finishing slots count towards the summary predictions.
const TOP_SLOTS: usize = 4;
const RELEGATION_SLOTS: usize = 2;

pub fn default_db_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS team_strength (
            club_code TEXT NOT NULL,
            computed_at TEXT NOT NULL,
            strength REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_team_strength_club ON team_strength(club_code);

        CREATE TABLE IF NOT EXISTS simulated_standing (
            club_code TEXT NOT NULL,
            computed_at TEXT NOT NULL,
            played INTEGER NOT NULL,
            position INTEGER NOT NULL,
            points INTEGER NOT NULL,
            top4_pct REAL NULL,
            relegation_pct REAL NULL
        );
        CREATE INDEX IF NOT EXISTS idx_simulated_standing_club ON simulated_standing(club_code);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Persist one timestamped snapshot: strength records plus the current
/// table annotated with top-4 and relegation probabilities from the
/// simulation percentages.
pub fn save_snapshot(
    conn: &mut Connection,
    standings: &[StandingsEntry],
    strengths: &HashMap<String, f64>,
    percentages: &HashMap<String, Vec<f64>>,
) -> Result<()> {
    let computed_at = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin snapshot transaction")?;

    for (code, strength) in strengths {
        tx.execute(
            "INSERT INTO team_strength(club_code, computed_at, strength) VALUES (?1, ?2, ?3)",
            params![code, computed_at, strength],
        )
        .context("insert team strength")?;
    }

    for entry in standings {
        let (top4, relegation) = percentages
            .get(&entry.team_code)
            .map(|pct| summarize(pct))
            .unwrap_or((None, None));
        tx.execute(
            "INSERT INTO simulated_standing(club_code, computed_at, played, position, points, top4_pct, relegation_pct)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.team_code,
                computed_at,
                entry.played,
                entry.position as i64,
                entry.points,
                top4,
                relegation,
            ],
        )
        .context("insert simulated standing")?;
    }

    tx.commit().context("commit snapshot")?;
    info!(
        strengths = strengths.len(),
        standings = standings.len(),
        "saved snapshot"
    );
    Ok(())
}

fn summarize(pct: &[f64]) -> (Option<f64>, Option<f64>) {
    if pct.is_empty() {
        return (None, None);
    }
    let top: f64 = pct.iter().take(TOP_SLOTS).sum();
    let start = pct.len().saturating_sub(RELEGATION_SLOTS);
    let relegation: f64 = pct[start..].iter().sum();
    (Some(top), Some(relegation))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSnapshot {
    pub version: u32,
    pub computed_at: String,
    pub strengths: HashMap<String, f64>,
    /// Per team, percentage of trials finishing in each position
    /// (index 0 = 1st place).
    pub position_percentages: HashMap<String, Vec<f64>>,
}

/// Write the simulation output as a JSON snapshot, via tmp-file swap so
/// readers never see a half-written file.
pub fn save_json_snapshot(
    path: &Path,
    strengths: &HashMap<String, f64>,
    percentages: &HashMap<String, Vec<f64>>,
) -> Result<()> {
    let snapshot = JsonSnapshot {
        version: JSON_SNAPSHOT_VERSION,
        computed_at: Utc::now().to_rfc3339(),
        strengths: strengths.clone(),
        position_percentages: percentages.clone(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(&snapshot).context("serialize snapshot")?;
    fs::write(&tmp, json).context("write snapshot")?;
    fs::rename(&tmp, path).context("swap snapshot")?;
    Ok(())
}

fn cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, position: usize, points: u32) -> StandingsEntry {
        StandingsEntry {
            team_code: code.to_string(),
            team_name: code.to_string(),
            position,
            played: 10,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points,
        }
    }

    #[test]
    fn snapshot_roundtrips_through_sqlite() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let standings = vec![entry("lech_poznan", 1, 24), entry("cracovia", 2, 20)];
        let strengths = HashMap::from([
            ("lech_poznan".to_string(), 0.81),
            ("cracovia".to_string(), 0.44),
        ]);
        let percentages = HashMap::from([
            ("lech_poznan".to_string(), vec![60.0, 30.0, 5.0, 3.0, 1.0, 1.0]),
            ("cracovia".to_string(), vec![5.0, 15.0, 30.0, 20.0, 20.0, 10.0]),
        ]);

        save_snapshot(&mut conn, &standings, &strengths, &percentages).unwrap();

        let strength_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM team_strength", [], |r| r.get(0))
            .unwrap();
        assert_eq!(strength_rows, 2);

        let (top4, relegation): (f64, f64) = conn
            .query_row(
                "SELECT top4_pct, relegation_pct FROM simulated_standing WHERE club_code = 'lech_poznan'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!((top4 - 98.0).abs() < 1e-9);
        assert!((relegation - 2.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_handles_short_arrays() {
        let (top, rel) = summarize(&[100.0]);
        assert_eq!(top, Some(100.0));
        assert_eq!(rel, Some(100.0));
        assert_eq!(summarize(&[]), (None, None));
    }
}
