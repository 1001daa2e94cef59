//! Geopolitical risk engine.
//!
//! Evolves a risk index in [0, 1] as a mean-reverting diffusion with
//! Poisson jump events. A jump forces the Crisis regime for a random
//! dwell period; the regime returns to Calm only once the dwell has
//! expired and the index has decayed below the calm threshold.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Geometric, StandardNormal};
use serde::{Deserialize, Serialize};

use types::{Regime, SimError, SimResult, Tick};

// =============================================================================
// RiskConfig
// =============================================================================

/// Configuration for the geopolitical risk process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Long-run level the index reverts toward.
    pub baseline: f64,

    /// Mean-reversion speed (per year).
    pub reversion_speed: f64,

    /// Diffusion volatility (per sqrt-year).
    pub volatility: f64,

    /// Expected number of jump events per year at zero risk. The per-step
    /// probability is scaled by `1 + index`, so tense periods breed events.
    pub jump_intensity_per_year: f64,

    /// A jump moves the index a uniform fraction of the remaining distance
    /// toward 1.0, drawn from this range.
    pub jump_fraction: (f64, f64),

    /// Mean crisis dwell in steps. Sampled from a geometric distribution
    /// when a jump fires.
    pub dwell_mean_steps: f64,

    /// The index must fall below this level (after dwell expiry) before
    /// the regime returns to Calm.
    pub calm_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            baseline: 0.3,
            reversion_speed: 2.0,
            volatility: 0.1,
            jump_intensity_per_year: 1.5,
            jump_fraction: (0.2, 0.6),
            dwell_mean_steps: 30.0,
            calm_threshold: 0.5,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.baseline) {
            return Err(SimError::Config(format!(
                "risk baseline {} is outside [0, 1]",
                self.baseline
            )));
        }
        if self.volatility < 0.0 || self.reversion_speed < 0.0 {
            return Err(SimError::Config(
                "risk volatility and reversion speed must be non-negative".into(),
            ));
        }
        if self.jump_intensity_per_year < 0.0 {
            return Err(SimError::Config(format!(
                "jump intensity {} must be non-negative",
                self.jump_intensity_per_year
            )));
        }
        let (lo, hi) = self.jump_fraction;
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(SimError::Config(format!(
                "jump fraction range ({lo}, {hi}) is not a sub-range of [0, 1]"
            )));
        }
        if self.dwell_mean_steps < 1.0 {
            return Err(SimError::Config(format!(
                "mean crisis dwell {} must be at least one step",
                self.dwell_mean_steps
            )));
        }
        if !(0.0..=1.0).contains(&self.calm_threshold) {
            return Err(SimError::Config(format!(
                "calm threshold {} is outside [0, 1]",
                self.calm_threshold
            )));
        }
        Ok(())
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_jump_intensity(mut self, per_year: f64) -> Self {
        self.jump_intensity_per_year = per_year;
        self
    }
}

// =============================================================================
// RiskEngine
// =============================================================================

/// Output of one risk step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskOutput {
    pub index: f64,
    pub regime: Regime,
    pub event_occurred: bool,
}

/// Mean-reverting jump-diffusion risk process with regime switching.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
    dt: f64,
    index: f64,
    regime: Regime,
    /// Steps of forced Crisis remaining after the last jump.
    dwell_remaining: u64,
}

impl RiskEngine {
    pub fn new(config: RiskConfig, dt: f64) -> Self {
        let index = config.baseline;
        Self {
            config,
            dt,
            index,
            regime: Regime::Calm,
            dwell_remaining: 0,
        }
    }

    pub fn index(&self) -> f64 {
        self.index
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Advance the risk process by one step.
    pub fn advance(&mut self, tick: Tick, rng: &mut StdRng) -> SimResult<RiskOutput> {
        let cfg = &self.config;
        let dt = self.dt;

        // Diffusion toward baseline.
        let z: f64 = StandardNormal.sample(rng);
        self.index += cfg.reversion_speed * (cfg.baseline - self.index) * dt
            + cfg.volatility * dt.sqrt() * z;

        // Jump events, intensity rising with the index itself.
        let jump_prob = (cfg.jump_intensity_per_year * dt * (1.0 + self.index)).min(1.0);
        let event_occurred = jump_prob > 0.0 && rng.random_bool(jump_prob);
        if event_occurred {
            let fraction = rng.random_range(cfg.jump_fraction.0..=cfg.jump_fraction.1);
            self.index += fraction * (1.0 - self.index);
            self.regime = Regime::Crisis;
            self.dwell_remaining = self.sample_dwell(rng)?;
        } else if self.regime.is_crisis() {
            self.dwell_remaining = self.dwell_remaining.saturating_sub(1);
            if self.dwell_remaining == 0 && self.index < cfg.calm_threshold {
                self.regime = Regime::Calm;
            }
        }

        // Policy clamp, not an error.
        self.index = self.index.clamp(0.0, 1.0);

        if !self.index.is_finite() {
            return Err(SimError::Numerical {
                step: tick,
                quantity: "risk index".into(),
                value: self.index,
            });
        }

        Ok(RiskOutput {
            index: self.index,
            regime: self.regime,
            event_occurred,
        })
    }

    /// Sample the crisis dwell (at least one step) from a geometric
    /// distribution with the configured mean.
    fn sample_dwell(&self, rng: &mut StdRng) -> SimResult<u64> {
        let p = (1.0 / self.config.dwell_mean_steps).clamp(f64::MIN_POSITIVE, 1.0);
        let dwell = Geometric::new(p)
            .map_err(|e| SimError::Config(format!("crisis dwell distribution: {e}")))?
            .sample(rng);
        Ok(dwell + 1)
    }
}

// =============================================================================
// Tests
// =============================================================================
