use std::collections::HashMap;

use crate::model::{MatchFixture, MatchProbability};

const HOME_ADVANTAGE: f64 = 0.10;
const PREVIOUS_MEETING_WEIGHT: f64 = 0.06;

// Softmax scaling: win components use the full strength scale, the draw
// component uses the average strength at a lower scale.
const STRENGTH_SCALE: f64 = 2.5;
const DRAW_SCALE: f64 = 1.6;

const UNKNOWN_TEAM_STRENGTH: f64 = 0.5;

/// Convert two team strengths into a home/draw/away probability triple.
///
/// `previous_meeting` is an optional directional hint: positive favors the
/// home side, negative the away side, zero or `None` has no effect. Any
/// degenerate normalization sum falls back to the neutral triple instead
/// of failing.
pub fn predict_fixture(
    strengths: &HashMap<String, f64>,
    fixture: &MatchFixture,
    previous_meeting: Option<i8>,
) -> MatchProbability {
    if fixture.home_team.is_empty() || fixture.away_team.is_empty() {
        return MatchProbability::neutral();
    }

    let home_strength = strengths
        .get(&fixture.home_team)
        .copied()
        .unwrap_or(UNKNOWN_TEAM_STRENGTH);
    let away_strength = strengths
        .get(&fixture.away_team)
        .copied()
        .unwrap_or(UNKNOWN_TEAM_STRENGTH);

    let mut adjusted_home = home_strength * (1.0 + HOME_ADVANTAGE);
    let mut adjusted_away = away_strength;

    match previous_meeting.unwrap_or(0) {
        f if f > 0 => adjusted_home += PREVIOUS_MEETING_WEIGHT,
        f if f < 0 => adjusted_away += PREVIOUS_MEETING_WEIGHT,
        _ => {}
    }

    let home_component = (adjusted_home * STRENGTH_SCALE).exp();
    let away_component = (adjusted_away * STRENGTH_SCALE).exp();
    let average = (adjusted_home + adjusted_away) / 2.0;
    let draw_component = (average * DRAW_SCALE).exp();

    let sum = home_component + draw_component + away_component;
    if sum <= 0.0 || !sum.is_finite() {
        return MatchProbability::neutral();
    }

    MatchProbability {
        home_win: home_component / sum,
        draw: draw_component / sum,
        away_win: away_component / sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(home: &str, away: &str) -> MatchFixture {
        MatchFixture {
            match_id: Some(format!("{home}-{away}")),
            round: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff: None,
        }
    }

    fn strengths(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(c, s)| (c.to_string(), *s)).collect()
    }

    #[test]
    fn triple_sums_to_one() {
        let s = strengths(&[("a", 0.9), ("b", 0.2)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        let sum = p.home_win + p.draw + p.away_win;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(p.home_win >= 0.0 && p.draw >= 0.0 && p.away_win >= 0.0);
    }

    #[test]
    fn home_advantage_breaks_equal_strengths() {
        let s = strengths(&[("a", 0.5), ("b", 0.5)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        assert!(p.home_win > p.away_win);
    }

    #[test]
    fn stronger_away_side_can_overcome_home_advantage() {
        let s = strengths(&[("a", 0.2), ("b", 0.9)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        assert!(p.away_win > p.home_win);
    }

    #[test]
    fn previous_meeting_hint_shifts_the_favored_side() {
        let s = strengths(&[("a", 0.5), ("b", 0.5)]);
        let base = predict_fixture(&s, &fixture("a", "b"), None);
        let home_hint = predict_fixture(&s, &fixture("a", "b"), Some(1));
        let away_hint = predict_fixture(&s, &fixture("a", "b"), Some(-1));

        assert!(home_hint.home_win > base.home_win);
        assert!(away_hint.away_win > base.away_win);
        // Zero hint behaves like no hint.
        let zero = predict_fixture(&s, &fixture("a", "b"), Some(0));
        assert_eq!(zero, base);
    }

    #[test]
    fn unmapped_codes_default_to_midtable_strength() {
        let s = strengths(&[("a", 0.5)]);
        let p = predict_fixture(&s, &fixture("a", "nobody"), None);
        let sym = predict_fixture(&s, &fixture("a", "a"), None);
        // Unknown opponent is treated exactly like a 0.5 team.
        assert!((p.home_win - sym.home_win).abs() < 1e-12);
    }

    #[test]
    fn degenerate_strengths_fall_back_to_neutral() {
        let s = strengths(&[("a", f64::NAN), ("b", 0.5)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        assert_eq!(p, MatchProbability::neutral());

        let s = strengths(&[("a", f64::INFINITY), ("b", 0.5)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        assert_eq!(p, MatchProbability::neutral());
    }

    #[test]
    fn missing_codes_fall_back_to_neutral() {
        let s = strengths(&[]);
        let blank = MatchFixture {
            match_id: None,
            round: None,
            home_team: String::new(),
            away_team: "b".to_string(),
            kickoff: None,
        };
        assert_eq!(predict_fixture(&s, &blank, None), MatchProbability::neutral());
    }

    #[test]
    fn out_of_range_strengths_still_produce_a_distribution() {
        let s = strengths(&[("a", 7.0), ("b", -3.0)]);
        let p = predict_fixture(&s, &fixture("a", "b"), None);
        let sum = p.home_win + p.draw + p.away_win;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(p.home_win > 0.99);
    }
}
