use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalized team identifier: trimmed, diacritics stripped, lowercased,
/// spaces replaced with underscores. This is the join key for results,
/// fixtures, strengths and the market value table.
pub fn team_code(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .replace(' ', "_")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub name: String,
}

impl Team {
    pub fn from_name(name: &str) -> Self {
        Self {
            code: team_code(name),
            name: name.trim().to_string(),
        }
    }
}

/// Per-side match statistics. Every field is optional; the season export
/// only carries the full set for matches with detailed coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub ball_possession: Option<f64>,
    pub expected_goals: Option<f64>,
    pub shots_on_target: Option<u32>,
    pub total_shots: Option<u32>,
    pub passes: Option<u32>,
    pub tackles: Option<u32>,
    pub interceptions: Option<u32>,
    pub keeper_saves: Option<u32>,
    pub yellow_cards: Option<u32>,
    pub red_cards: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

/// A finished match. Rows missing goals or a team code, or with
/// `finished == false`, are carried as-is and filtered at the point of use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: Option<String>,
    pub finished: bool,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub home_stats: Option<MatchStats>,
    pub away_stats: Option<MatchStats>,
}

impl MatchResult {
    /// Valid results are the only ones standings and season points are
    /// built from: finished, both team codes present, both goals present.
    pub fn is_valid(&self) -> bool {
        self.finished
            && !self.home_team.is_empty()
            && !self.away_team.is_empty()
            && self.home_goals.is_some()
            && self.away_goals.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        let (Some(hg), Some(ag)) = (self.home_goals, self.away_goals) else {
            return None;
        };
        Some(Outcome::from_score(hg, ag))
    }
}

/// An unplayed match, the unit the simulator iterates over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFixture {
    pub match_id: Option<String>,
    pub round: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<DateTime<Utc>>,
}

/// Probability triple for a fixture. Components are non-negative and sum
/// to 1 in the home/draw/away order the sampler partitions over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchProbability {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl MatchProbability {
    /// Fallback used whenever the predictor cannot produce a finite,
    /// positive normalization sum.
    pub fn neutral() -> Self {
        Self {
            home_win: 0.33,
            draw: 0.34,
            away_win: 0.33,
        }
    }
}
