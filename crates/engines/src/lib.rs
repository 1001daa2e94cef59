//! Market engines for the ReserveFlow simulation.
//!
//! Four engines advance the market each step, in dependency order:
//!
//! 1. [`risk`] - geopolitical risk index and calm/crisis regime
//! 2. [`fx`] - correlated exchange-rate dynamics
//! 3. [`metals`] - gold and silver prices
//! 4. [`sdr`] - SDR basket valuation and allocation events
//!
//! Engines are deterministic: they own no RNG and draw from the run's
//! single seeded generator, which the orchestrator lends to each engine
//! in the order above.

pub mod fx;
pub mod metals;
pub mod risk;
pub mod sdr;

pub use fx::{FxConfig, FxEngine};
pub use metals::{MetalsConfig, MetalsEngine};
pub use risk::{RiskConfig, RiskEngine, RiskOutput};
pub use sdr::{SdrConfig, SdrEngine, SdrOutput};
