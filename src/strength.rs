use std::collections::HashMap;

use crate::club_values;
use crate::model::{MatchResult, Team};

// How many of a team's most recent matches feed the base score, and how
// much extra weight the newest one carries over the oldest.
const RECENCY_WINDOW: usize = 8;
const RECENCY_WEIGHT_FACTOR: f64 = 0.15;

// Per-metric weights of the composite match score. Values are normalized
// against the window maximum of the same metric before weighting.
const WEIGHT_GOALS_FOR: f64 = 0.21;
const WEIGHT_GOALS_AGAINST: f64 = 0.18; // inverted: conceding less is better
const WEIGHT_POSSESSION: f64 = 0.03;
const WEIGHT_EXPECTED_GOALS: f64 = 0.24;
const WEIGHT_SHOTS_ON_TARGET: f64 = 0.14;
const WEIGHT_TOTAL_SHOTS: f64 = 0.04;
const WEIGHT_PASSES: f64 = 0.02;
const WEIGHT_TACKLES: f64 = 0.01;
const WEIGHT_INTERCEPTIONS: f64 = 0.01;
const WEIGHT_KEEPER_SAVES: f64 = 0.02;
const WEIGHT_CARDS: f64 = 0.03; // subtracted
const WEIGHT_MATCH_RESULT_POINTS: f64 = 0.15;
const MATCH_POINTS_DIVISOR: f64 = 3.0;

// Blend weights for the external signals. Market value dominating the
// match-based score is intentional.
const WEIGHT_MARKET_VALUE: f64 = 0.74;
const WEIGHT_SEASON_POINTS: f64 = 0.10;

const DEFAULT_STRENGTH: f64 = 0.1;

/// Raw metrics of one match from the perspective of one team. Missing
/// statistics default to zero.
#[derive(Debug, Clone, Copy, Default)]
struct MatchMetrics {
    goals_for: f64,
    goals_against: f64,
    possession: f64,
    expected_goals: f64,
    shots_on_target: f64,
    total_shots: f64,
    passes: f64,
    tackles: f64,
    interceptions: f64,
    keeper_saves: f64,
    yellow_cards: f64,
    red_cards: f64,
    match_points: f64,
}

/// Composite strength in [0,1] for every roster team: windowed match
/// score blended with normalized market value and season points.
///
/// `matches` must be ordered oldest to newest; the recency weighting
/// relies on that caller contract.
pub fn calculate_all_strengths(
    roster: &[Team],
    matches: &[MatchResult],
) -> HashMap<String, f64> {
    let season_points = season_points(matches);
    let max_season_points = season_points.values().copied().max().unwrap_or(0);
    let max_market_value = club_values::max_market_value();

    let mut strengths = HashMap::with_capacity(roster.len());
    for team in roster {
        let base = base_match_score(&team.code, matches);

        let points = season_points.get(&team.code).copied().unwrap_or(0);
        let normalized_points = if max_season_points > 0 {
            points as f64 / max_season_points as f64
        } else {
            0.0
        };
        let normalized_value = match club_values::market_value(&team.code) {
            Some(v) if max_market_value > 0 => v as f64 / max_market_value as f64,
            _ => 0.0,
        };

        let base_weight = (1.0 - (WEIGHT_MARKET_VALUE + WEIGHT_SEASON_POINTS)).max(0.0);
        let blended = base * base_weight
            + normalized_value * WEIGHT_MARKET_VALUE
            + normalized_points * WEIGHT_SEASON_POINTS;

        strengths.insert(team.code.clone(), blended.clamp(0.0, 1.0));
    }
    strengths
}

/// Match-performance component of the strength, before any blending.
/// Teams without a single finished match score the default 0.1.
pub fn base_match_score(team_code: &str, matches: &[MatchResult]) -> f64 {
    if team_code.is_empty() || matches.is_empty() {
        return DEFAULT_STRENGTH;
    }

    let team_matches: Vec<&MatchResult> = matches
        .iter()
        .filter(|m| m.finished && (m.home_team == team_code || m.away_team == team_code))
        .collect();
    if team_matches.is_empty() {
        return DEFAULT_STRENGTH;
    }

    let start = team_matches.len().saturating_sub(RECENCY_WINDOW);
    let window = &team_matches[start..];

    let metrics: Vec<MatchMetrics> = window
        .iter()
        .map(|m| extract_metrics(team_code, m))
        .collect();
    let max = window_maxima(&metrics);

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let count = metrics.len();
    for (i, m) in metrics.iter().enumerate() {
        let score = composite_score(m, &max);
        // Oldest match multiplier ~1.0, newest 1.0 + RECENCY_WEIGHT_FACTOR.
        let recency = 1.0 + ((i + 1) as f64 / count as f64) * RECENCY_WEIGHT_FACTOR;
        weighted_sum += score * recency;
        weight_total += recency;
    }

    if weight_total <= 0.0 {
        return DEFAULT_STRENGTH;
    }
    (weighted_sum / weight_total).clamp(0.0, 1.0)
}

/// Season points per team code from valid finished matches (3/1/0). This
/// intentionally re-derives points instead of reusing a standings table.
pub fn season_points(matches: &[MatchResult]) -> HashMap<String, u32> {
    let mut points: HashMap<String, u32> = HashMap::new();
    for m in matches {
        if !m.is_valid() {
            continue;
        }
        let hg = m.home_goals.unwrap_or(0);
        let ag = m.away_goals.unwrap_or(0);
        let home = points.entry(m.home_team.clone()).or_insert(0);
        match hg.cmp(&ag) {
            std::cmp::Ordering::Greater => *home += 3,
            std::cmp::Ordering::Equal => *home += 1,
            std::cmp::Ordering::Less => {}
        }
        let away = points.entry(m.away_team.clone()).or_insert(0);
        match ag.cmp(&hg) {
            std::cmp::Ordering::Greater => *away += 3,
            std::cmp::Ordering::Equal => *away += 1,
            std::cmp::Ordering::Less => {}
        }
    }
    points
}

fn extract_metrics(team_code: &str, m: &MatchResult) -> MatchMetrics {
    let is_home = m.home_team == team_code;
    let stats = if is_home { m.home_stats.as_ref() } else { m.away_stats.as_ref() };

    let (goals_for, goals_against) = if is_home {
        (m.home_goals, m.away_goals)
    } else {
        (m.away_goals, m.home_goals)
    };

    let match_points = match (m.home_goals, m.away_goals) {
        (Some(hg), Some(ag)) => {
            if (is_home && hg > ag) || (!is_home && ag > hg) {
                3.0
            } else if hg == ag {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    MatchMetrics {
        goals_for: goals_for.unwrap_or(0) as f64,
        goals_against: goals_against.unwrap_or(0) as f64,
        possession: stats.and_then(|s| s.ball_possession).unwrap_or(0.0),
        expected_goals: stats.and_then(|s| s.expected_goals).unwrap_or(0.0),
        shots_on_target: stats.and_then(|s| s.shots_on_target).unwrap_or(0) as f64,
        total_shots: stats.and_then(|s| s.total_shots).unwrap_or(0) as f64,
        passes: stats.and_then(|s| s.passes).unwrap_or(0) as f64,
        tackles: stats.and_then(|s| s.tackles).unwrap_or(0) as f64,
        interceptions: stats.and_then(|s| s.interceptions).unwrap_or(0) as f64,
        keeper_saves: stats.and_then(|s| s.keeper_saves).unwrap_or(0) as f64,
        yellow_cards: stats.and_then(|s| s.yellow_cards).unwrap_or(0) as f64,
        red_cards: stats.and_then(|s| s.red_cards).unwrap_or(0) as f64,
        match_points,
    }
}

fn window_maxima(metrics: &[MatchMetrics]) -> MatchMetrics {
    let mut max = MatchMetrics::default();
    for m in metrics {
        max.goals_for = max.goals_for.max(m.goals_for);
        max.goals_against = max.goals_against.max(m.goals_against);
        max.possession = max.possession.max(m.possession);
        max.expected_goals = max.expected_goals.max(m.expected_goals);
        max.shots_on_target = max.shots_on_target.max(m.shots_on_target);
        max.total_shots = max.total_shots.max(m.total_shots);
        max.passes = max.passes.max(m.passes);
        max.tackles = max.tackles.max(m.tackles);
        max.interceptions = max.interceptions.max(m.interceptions);
        max.keeper_saves = max.keeper_saves.max(m.keeper_saves);
        max.yellow_cards = max.yellow_cards.max(m.yellow_cards);
        max.red_cards = max.red_cards.max(m.red_cards);
        max.match_points = max.match_points.max(m.match_points);
    }
    max
}

fn composite_score(m: &MatchMetrics, max: &MatchMetrics) -> f64 {
    let mut score = 0.0;

    score += WEIGHT_GOALS_FOR * normalize(m.goals_for, max.goals_for);
    score += WEIGHT_POSSESSION * normalize(m.possession, max.possession);
    score += WEIGHT_EXPECTED_GOALS * normalize(m.expected_goals, max.expected_goals);
    score += WEIGHT_SHOTS_ON_TARGET * normalize(m.shots_on_target, max.shots_on_target);
    score += WEIGHT_TOTAL_SHOTS * normalize(m.total_shots, max.total_shots);
    score += WEIGHT_PASSES * normalize(m.passes, max.passes);

    // Conceding is inverted: a clean sheet in the window's worst defensive
    // match scores the full weight.
    score += WEIGHT_GOALS_AGAINST * (1.0 - normalize(m.goals_against, max.goals_against));

    score += WEIGHT_TACKLES * normalize(m.tackles, max.tackles);
    score += WEIGHT_INTERCEPTIONS * normalize(m.interceptions, max.interceptions);
    score += WEIGHT_KEEPER_SAVES * normalize(m.keeper_saves, max.keeper_saves);

    let cards = normalize(
        m.yellow_cards + m.red_cards,
        max.yellow_cards + max.red_cards,
    );
    score -= WEIGHT_CARDS * cards;

    score += WEIGHT_MATCH_RESULT_POINTS * normalize(m.match_points, MATCH_POINTS_DIVISOR);

    score.clamp(0.0, 1.0)
}

fn normalize(value: f64, max: f64) -> f64 {
    if max <= 0.0 { 0.0 } else { value / max }
}
