use rand::Rng;

use crate::model::{MatchProbability, Outcome};

/// Inverse-CDF categorical draw over the ordered (home, draw, away)
/// partition of [0,1).
pub fn sample_outcome<R: Rng + ?Sized>(rng: &mut R, p: &MatchProbability) -> Outcome {
    let r: f64 = rng.gen_range(0.0..1.0);
    if r < p.home_win {
        Outcome::HomeWin
    } else if r < p.home_win + p.draw {
        Outcome::Draw
    } else {
        Outcome::AwayWin
    }
}
