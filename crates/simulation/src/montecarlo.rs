//! Monte Carlo replication across independent runs.
//!
//! Parallelism in the simulation is cross-run only: each replication owns
//! its full engine and agent state, and runs share nothing but the
//! borrowed configuration. The `cfg` logic lives here in one place; with
//! the `parallel` feature disabled (or `force_sequential` set) the same
//! code path runs on a plain iterator.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use types::{SimResult, SimulationResult};

use crate::config::ScenarioConfig;
use crate::runner;

/// Run `replications` independent simulations with seeds
/// `base_seed, base_seed + 1, ...`, returning results in seed order.
///
/// # Parameters
/// - `force_sequential`: when true, runs sequentially even with the
///   `parallel` feature enabled.
pub fn run_many(
    config: &ScenarioConfig,
    steps: u64,
    base_seed: u64,
    replications: usize,
    force_sequential: bool,
) -> SimResult<Vec<SimulationResult>> {
    let seeds: Vec<u64> = (0..replications)
        .map(|i| base_seed.wrapping_add(i as u64))
        .collect();

    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            seeds
                .iter()
                .map(|&seed| runner::run(config.clone(), steps, seed))
                .collect()
        } else {
            seeds
                .par_iter()
                .map(|&seed| runner::run(config.clone(), steps, seed))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        seeds
            .iter()
            .map(|&seed| runner::run(config.clone(), steps, seed))
            .collect()
    }
}
