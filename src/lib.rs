//! Ekstraklasa season predictor: standings with head-to-head tie-breaks,
//! a market-value-anchored team strength model, a softmax fixture
//! predictor and a Monte Carlo simulator for final-table probabilities.

pub mod club_values;
pub mod dataset;
pub mod model;
pub mod persist;
pub mod predict;
pub mod sampler;
pub mod simulate;
pub mod standings;
pub mod strength;
