//! Simulation orchestration for ReserveFlow.
//!
//! Composes the market engines and the agent roster into a deterministic
//! step loop: risk, FX, metals, SDR, then agents, with the snapshot
//! committed at the end of each step. Identical `(config, seed)` pairs
//! produce bit-identical results.

pub mod config;
pub mod montecarlo;
pub mod runner;
pub mod stats;
pub mod summary;

pub use config::{Scenario, ScenarioConfig, StepFrequency};
pub use montecarlo::run_many;
pub use runner::{run, Simulation, SimulationClock, SimulationStats};
pub use summary::RunSummary;
