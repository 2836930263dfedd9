use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::model::{MatchFixture, MatchResult, Outcome, Team};
use crate::predict::predict_fixture;
use crate::sampler::sample_outcome;
use crate::standings::calculate_standings;
use crate::strength::calculate_all_strengths;

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub trials: u64,
    /// Optional run seed for reproducible output. `None` draws one from
    /// thread entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 20_000,
            seed: None,
        }
    }
}

/// Position counters per team over all completed trials. Index 0 of a
/// team's counter array is 1st place. Owned by exactly one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationTally {
    league_size: usize,
    trials: u64,
    position_counts: HashMap<String, Vec<u64>>,
}

impl SimulationTally {
    pub fn new(league_size: usize) -> Self {
        Self {
            league_size,
            trials: 0,
            position_counts: HashMap::new(),
        }
    }

    pub fn league_size(&self) -> usize {
        self.league_size
    }

    /// Trials actually recorded; lower than the requested count only when
    /// the run was cancelled.
    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn ensure_team(&mut self, team_code: &str) {
        if !self.position_counts.contains_key(team_code) {
            self.position_counts
                .insert(team_code.to_string(), vec![0; self.league_size]);
        }
    }

    /// Count one final `position` (1-based) for a team. Positions outside
    /// [1, league_size] are ignored.
    pub fn increment(&mut self, team_code: &str, position: usize) {
        if position < 1 || position > self.league_size {
            return;
        }
        self.ensure_team(team_code);
        if let Some(counts) = self.position_counts.get_mut(team_code) {
            counts[position - 1] += 1;
        }
    }

    /// Element-wise sum of two tallies from the same run.
    fn merge(mut self, other: SimulationTally) -> SimulationTally {
        self.trials += other.trials;
        for (code, counts) in other.position_counts {
            let entry = self
                .position_counts
                .entry(code)
                .or_insert_with(|| vec![0; self.league_size]);
            for (slot, count) in entry.iter_mut().zip(counts) {
                *slot += count;
            }
        }
        self
    }

    /// Finishing-position percentages per team, index 0 = 1st place.
    /// Seeded teams that never appeared stay all-zero.
    pub fn percentages(&self) -> HashMap<String, Vec<f64>> {
        if self.trials == 0 {
            return HashMap::new();
        }
        self.position_counts
            .iter()
            .map(|(code, counts)| {
                let pct = counts
                    .iter()
                    .map(|&c| (c as f64 * 100.0) / self.trials as f64)
                    .collect();
                (code.clone(), pct)
            })
            .collect()
    }
}

/// Simulate the rest of the season `config.trials` times and tally final
/// positions per team.
///
/// Strengths are computed once from the finished results and shared
/// read-only across trials. Trials run on the rayon pool with one
/// deterministic RNG per trial, so a fixed seed reproduces the exact
/// tally regardless of scheduling; per-worker tallies are merged by
/// summation at the end. The `cancel` flag is checked between trials and
/// aborting never applies a partial trial.
pub fn run_simulation(
    roster: &[Team],
    results: &[MatchResult],
    fixtures: &[MatchFixture],
    config: &SimulationConfig,
    cancel: &AtomicBool,
) -> Result<SimulationTally> {
    if fixtures.is_empty() {
        bail!("no fixtures to simulate");
    }
    if config.trials == 0 {
        bail!("trial count must be at least 1");
    }

    let strengths = calculate_all_strengths(roster, results);
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    let league_size = roster.len();

    info!(
        trials = config.trials,
        seed,
        fixtures = fixtures.len(),
        "running season simulation"
    );

    let mut tally = (0..config.trials)
        .into_par_iter()
        .fold(
            || SimulationTally::new(league_size),
            |mut local, trial| {
                if cancel.load(Ordering::Relaxed) {
                    return local;
                }
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(trial));
                run_trial(&mut rng, &strengths, results, fixtures, &mut local);
                local.trials += 1;
                local
            },
        )
        .reduce(|| SimulationTally::new(league_size), SimulationTally::merge);

    // Teams that never scored a single counter still belong in the output.
    for team in roster {
        tally.ensure_team(&team.code);
    }

    if cancel.load(Ordering::Relaxed) {
        debug!(completed = tally.trials, "simulation cancelled");
    }
    Ok(tally)
}

fn run_trial(
    rng: &mut StdRng,
    strengths: &HashMap<String, f64>,
    results: &[MatchResult],
    fixtures: &[MatchFixture],
    tally: &mut SimulationTally,
) {
    let mut combined: Vec<MatchResult> = results.to_vec();

    for fixture in fixtures {
        let probability = predict_fixture(strengths, fixture, None);
        let outcome = sample_outcome(rng, &probability);
        combined.push(synthesize_result(rng, fixture, outcome));
    }

    for entry in calculate_standings(&combined) {
        tally.increment(&entry.team_code, entry.position);
    }
}

/// Invent a scoreline consistent with the sampled outcome. The magnitude
/// is independent of the probabilities; only the sign matters upstream.
fn synthesize_result(rng: &mut StdRng, fixture: &MatchFixture, outcome: Outcome) -> MatchResult {
    let (home_goals, away_goals) = match outcome {
        Outcome::HomeWin => {
            let hg = rng.gen_range(1..=3u32);
            (hg, rng.gen_range(0..hg))
        }
        Outcome::AwayWin => {
            let ag = rng.gen_range(1..=3u32);
            (rng.gen_range(0..ag), ag)
        }
        Outcome::Draw => {
            let g = rng.gen_range(0..3u32);
            (g, g)
        }
    };

    MatchResult {
        match_id: fixture.match_id.clone(),
        finished: true,
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        home_goals: Some(home_goals),
        away_goals: Some(away_goals),
        home_stats: None,
        away_stats: None,
    }
}
