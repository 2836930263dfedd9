use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::MatchResult;

/// Per-team aggregate for one standings calculation. Recomputed from
/// scratch on every call; `position` is 1-based and shared by ex-aequo
/// teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub team_code: String,
    pub team_name: String,
    pub position: usize,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: u32,
}

impl StandingsEntry {
    fn new(code: &str) -> Self {
        Self {
            team_code: code.to_string(),
            team_name: code.to_string(),
            position: 0,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    /// Sort key for the last tie-break criterion: display name when set,
    /// otherwise the code.
    fn sort_name(&self) -> &str {
        if self.team_name.trim().is_empty() {
            &self.team_code
        } else {
            &self.team_name
        }
    }
}

/// Standings restricted to matches between a set of point-tied teams,
/// used purely as a tie-break signal.
#[derive(Debug, Clone, Copy, Default)]
struct HeadToHead {
    points: i32,
    goals_for: i32,
    goals_against: i32,
}

impl HeadToHead {
    fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

/// Aggregate a set of completed matches into a ranked league table.
///
/// Invalid results (unfinished, missing goals or team codes) are skipped,
/// duplicate match ids keep their first occurrence, and the ordering is
/// fully deterministic: points, then head-to-head points and goal
/// difference within point-tied groups, then overall goal difference,
/// goals scored and finally name.
pub fn calculate_standings(results: &[MatchResult]) -> Vec<StandingsEntry> {
    if results.is_empty() {
        return Vec::new();
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut unique: Vec<&MatchResult> = Vec::new();
    let mut entries: HashMap<&str, StandingsEntry> = HashMap::new();

    for result in results {
        if !result.is_valid() {
            continue;
        }
        if let Some(id) = result.match_id.as_deref() {
            // First occurrence of a match id wins.
            if !seen_ids.insert(id) {
                continue;
            }
        }
        unique.push(result);

        let hg = result.home_goals.unwrap_or(0) as i32;
        let ag = result.away_goals.unwrap_or(0) as i32;

        let home = entries
            .entry(result.home_team.as_str())
            .or_insert_with(|| StandingsEntry::new(&result.home_team));
        fold_side(home, hg, ag, true);

        let away = entries
            .entry(result.away_team.as_str())
            .or_insert_with(|| StandingsEntry::new(&result.away_team));
        fold_side(away, hg, ag, false);
    }

    let mut table: Vec<StandingsEntry> = entries.into_values().collect();
    for entry in &mut table {
        entry.goal_difference = entry.goals_for - entry.goals_against;
    }

    let table = order_with_head_to_head(table, &unique);
    assign_positions(table, &unique)
}

fn fold_side(entry: &mut StandingsEntry, home_goals: i32, away_goals: i32, is_home: bool) {
    let (scored, conceded) = if is_home {
        (home_goals, away_goals)
    } else {
        (away_goals, home_goals)
    };
    entry.played += 1;
    entry.goals_for += scored;
    entry.goals_against += conceded;
    match scored.cmp(&conceded) {
        std::cmp::Ordering::Greater => {
            entry.won += 1;
            entry.points += 3;
        }
        std::cmp::Ordering::Equal => {
            entry.drawn += 1;
            entry.points += 1;
        }
        std::cmp::Ordering::Less => entry.lost += 1,
    }
}

/// Partition into point groups, order groups by points descending and
/// break ties inside each group with a restricted head-to-head table.
fn order_with_head_to_head(
    table: Vec<StandingsEntry>,
    unique: &[&MatchResult],
) -> Vec<StandingsEntry> {
    let mut groups: HashMap<u32, Vec<StandingsEntry>> = HashMap::new();
    for entry in table {
        groups.entry(entry.points).or_default().push(entry);
    }

    let mut point_totals: Vec<u32> = groups.keys().copied().collect();
    point_totals.sort_unstable_by(|a, b| b.cmp(a));

    let mut ordered = Vec::new();
    for pts in point_totals {
        let Some(mut group) = groups.remove(&pts) else {
            continue;
        };
        if group.len() == 1 {
            ordered.append(&mut group);
            continue;
        }

        let codes: HashSet<String> = group.iter().map(|e| e.team_code.clone()).collect();
        let h2h = head_to_head_map(&codes, unique);

        group.sort_by(|a, b| {
            let ha = h2h.get(a.team_code.as_str()).copied().unwrap_or_default();
            let hb = h2h.get(b.team_code.as_str()).copied().unwrap_or_default();
            hb.points
                .cmp(&ha.points)
                .then(hb.goal_difference().cmp(&ha.goal_difference()))
                .then(b.goal_difference.cmp(&a.goal_difference))
                .then(b.goals_for.cmp(&a.goals_for))
                .then_with(|| a.sort_name().cmp(b.sort_name()))
        });
        ordered.append(&mut group);
    }
    ordered
}

fn head_to_head_map(
    codes: &HashSet<String>,
    unique: &[&MatchResult],
) -> HashMap<String, HeadToHead> {
    let mut map: HashMap<String, HeadToHead> =
        codes.iter().map(|c| (c.clone(), HeadToHead::default())).collect();

    for m in unique {
        let (home, away) = (m.home_team.as_str(), m.away_team.as_str());
        if !codes.contains(home) || !codes.contains(away) {
            continue;
        }
        let hg = m.home_goals.unwrap_or(0) as i32;
        let ag = m.away_goals.unwrap_or(0) as i32;

        if let Some(h) = map.get_mut(home) {
            h.goals_for += hg;
            h.goals_against += ag;
            match hg.cmp(&ag) {
                std::cmp::Ordering::Greater => h.points += 3,
                std::cmp::Ordering::Equal => h.points += 1,
                std::cmp::Ordering::Less => {}
            }
        }
        if let Some(a) = map.get_mut(away) {
            a.goals_for += ag;
            a.goals_against += hg;
            match ag.cmp(&hg) {
                std::cmp::Ordering::Greater => a.points += 3,
                std::cmp::Ordering::Equal => a.points += 1,
                std::cmp::Ordering::Less => {}
            }
        }
    }
    map
}

/// Two adjacent entries share a position when they are tied on points,
/// pairwise head-to-head points and goal difference, and overall goal
/// difference. Position numbers skip values after an ex-aequo block.
fn are_tied(a: &StandingsEntry, b: &StandingsEntry, unique: &[&MatchResult]) -> bool {
    if a.points != b.points {
        return false;
    }
    let pair: HashSet<String> = [a.team_code.clone(), b.team_code.clone()].into();
    let h2h = head_to_head_map(&pair, unique);
    let ha = h2h.get(a.team_code.as_str()).copied().unwrap_or_default();
    let hb = h2h.get(b.team_code.as_str()).copied().unwrap_or_default();

    ha.points == hb.points
        && ha.goal_difference() == hb.goal_difference()
        && a.goal_difference == b.goal_difference
}

fn assign_positions(
    mut table: Vec<StandingsEntry>,
    unique: &[&MatchResult],
) -> Vec<StandingsEntry> {
    for index in 0..table.len() {
        if index == 0 {
            table[0].position = 1;
            continue;
        }
        table[index].position = if are_tied(&table[index], &table[index - 1], unique) {
            table[index - 1].position
        } else {
            index + 1
        };
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, home: &str, away: &str, hg: u32, ag: u32) -> MatchResult {
        MatchResult {
            match_id: Some(id.to_string()),
            finished: true,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: Some(hg),
            away_goals: Some(ag),
            ..Default::default()
        }
    }

    #[test]
    fn empty_and_invalid_inputs_yield_empty_table() {
        assert!(calculate_standings(&[]).is_empty());

        let unfinished = MatchResult {
            finished: false,
            home_team: "a".to_string(),
            away_team: "b".to_string(),
            home_goals: Some(1),
            away_goals: Some(0),
            ..Default::default()
        };
        assert!(calculate_standings(&[unfinished]).is_empty());
    }

    #[test]
    fn duplicate_match_ids_count_once() {
        let table = calculate_standings(&[
            result("m1", "a", "b", 2, 0),
            result("m1", "a", "b", 2, 0),
        ]);
        let a = table.iter().find(|e| e.team_code == "a").unwrap();
        assert_eq!(a.played, 1);
        assert_eq!(a.points, 3);
    }

    #[test]
    fn win_draw_loss_accounting() {
        let table = calculate_standings(&[
            result("m1", "a", "b", 3, 1),
            result("m2", "b", "c", 1, 1),
        ]);
        let a = table.iter().find(|e| e.team_code == "a").unwrap();
        let b = table.iter().find(|e| e.team_code == "b").unwrap();
        let c = table.iter().find(|e| e.team_code == "c").unwrap();

        assert_eq!((a.won, a.drawn, a.lost, a.points), (1, 0, 0, 3));
        assert_eq!((b.won, b.drawn, b.lost, b.points), (0, 1, 1, 1));
        assert_eq!((c.won, c.drawn, c.lost, c.points), (0, 1, 0, 1));
        assert_eq!(a.goal_difference, 2);
        assert_eq!(b.goal_difference, -2);
    }

    #[test]
    fn head_to_head_decides_before_overall_goal_difference() {
        // a and b both finish on 3 points; b beat a directly but a has the
        // better overall goal difference. Direct meeting wins.
        let table = calculate_standings(&[
            result("m1", "b", "a", 1, 0),
            result("m2", "a", "c", 5, 0),
            result("m3", "c", "b", 0, 1),
            result("m4", "c", "a", 1, 2),
            result("m5", "b", "c", 0, 4),
        ]);
        // points: a = 6, b = 6, c = 3
        let first = &table[0];
        let second = &table[1];
        assert_eq!(first.team_code, "b");
        assert_eq!(second.team_code, "a");
    }

    #[test]
    fn drawn_head_to_head_with_equal_goal_difference_shares_position() {
        // a and b: 4 points each, drew their meeting 1-1, identical overall
        // goal difference. They must share position 1 and the next team
        // gets position 3.
        let table = calculate_standings(&[
            result("m1", "a", "b", 1, 1),
            result("m2", "a", "c", 2, 0),
            result("m3", "b", "c", 2, 0),
            result("m4", "c", "d", 1, 0),
        ]);
        let a = table.iter().find(|e| e.team_code == "a").unwrap();
        let b = table.iter().find(|e| e.team_code == "b").unwrap();
        let c = table.iter().find(|e| e.team_code == "c").unwrap();
        assert_eq!(a.position, 1);
        assert_eq!(b.position, 1);
        assert_eq!(c.position, 3);
    }

    #[test]
    fn name_is_the_last_resort_tie_break() {
        // Identical records in every criterion; ordering falls back to the
        // lexicographic name but both still share the position number.
        let table = calculate_standings(&[
            result("m1", "zeta", "alfa", 0, 0),
        ]);
        assert_eq!(table[0].team_code, "alfa");
        assert_eq!(table[1].team_code, "zeta");
        assert_eq!(table[0].position, 1);
        assert_eq!(table[1].position, 1);
    }
}
