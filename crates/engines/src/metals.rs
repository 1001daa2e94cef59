//! Precious-metals engine.
//!
//! Gold follows a log-space GBM with mean reversion toward a long-term
//! anchor, a linear price impact from central-bank purchase flow, and a
//! flight-to-safety drift tied to the risk index. Silver is priced off
//! gold through a mean-reverting log gold/silver ratio with idiosyncratic
//! noise and a seasonal industrial-demand term.

use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use types::{Regime, SimError, SimResult, Tick};

// =============================================================================
// MetalsConfig
// =============================================================================

/// Configuration for the gold and silver processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalsConfig {
    /// Initial gold price, USD per troy ounce.
    pub initial_gold_price: f64,

    /// Initial silver price, USD per troy ounce.
    pub initial_silver_price: f64,

    /// Annualized gold volatility.
    pub gold_volatility: f64,

    /// Annualized base gold drift.
    pub gold_drift: f64,

    /// Long-term gold anchor the log price reverts toward.
    pub long_term_gold_price: f64,

    /// Mean-reversion speed toward the anchor (per year).
    pub reversion_speed: f64,

    /// Annual gold drift per kilotonne/year of net central-bank buying.
    pub purchase_impact_per_kt: f64,

    /// Annual gold drift per unit of risk index.
    pub flight_to_safety: f64,

    /// Volatility multiplier applied under Crisis.
    pub crisis_vol_multiplier: f64,

    /// Long-term gold/silver ratio the log ratio reverts toward.
    pub ratio_target: f64,

    /// Ratio mean-reversion speed (per year).
    pub ratio_reversion_speed: f64,

    /// Annualized idiosyncratic volatility of the log ratio.
    pub ratio_volatility: f64,

    /// Amplitude of the seasonal industrial-demand swing in the log ratio.
    pub seasonal_amplitude: f64,
}

impl Default for MetalsConfig {
    fn default() -> Self {
        Self {
            initial_gold_price: 2000.0,
            initial_silver_price: 25.0,
            gold_volatility: 0.20,
            gold_drift: 0.0,
            long_term_gold_price: 2200.0,
            reversion_speed: 0.05,
            purchase_impact_per_kt: 0.02,
            flight_to_safety: 0.1,
            crisis_vol_multiplier: 2.0,
            ratio_target: 80.0,
            ratio_reversion_speed: 1.0,
            ratio_volatility: 0.15,
            seasonal_amplitude: 0.02,
        }
    }
}

impl MetalsConfig {
    pub fn validate(&self) -> SimResult<()> {
        for (name, price) in [
            ("initial gold price", self.initial_gold_price),
            ("initial silver price", self.initial_silver_price),
            ("long-term gold price", self.long_term_gold_price),
            ("gold/silver ratio target", self.ratio_target),
        ] {
            if !(price.is_finite() && price > 0.0) {
                return Err(SimError::Config(format!("{name} {price} is not positive")));
            }
        }
        for (name, vol) in [
            ("gold volatility", self.gold_volatility),
            ("ratio volatility", self.ratio_volatility),
            ("reversion speed", self.reversion_speed),
            ("ratio reversion speed", self.ratio_reversion_speed),
        ] {
            if vol < 0.0 {
                return Err(SimError::Config(format!("{name} {vol} is negative")));
            }
        }
        if self.crisis_vol_multiplier < 1.0 {
            return Err(SimError::Config(format!(
                "crisis volatility multiplier {} must be at least 1",
                self.crisis_vol_multiplier
            )));
        }
        Ok(())
    }

    pub fn with_gold_volatility(mut self, vol: f64) -> Self {
        self.gold_volatility = vol;
        self
    }

    pub fn with_long_term_gold_price(mut self, price: f64) -> Self {
        self.long_term_gold_price = price;
        self
    }
}

// =============================================================================
// MetalsEngine
// =============================================================================

/// Gold and silver price processes.
#[derive(Debug, Clone)]
pub struct MetalsEngine {
    config: MetalsConfig,
    dt: f64,
    gold_price: f64,
    silver_price: f64,
}

impl MetalsEngine {
    pub fn new(config: MetalsConfig, dt: f64) -> Self {
        let gold_price = config.initial_gold_price;
        let silver_price = config.initial_silver_price;
        Self {
            config,
            dt,
            gold_price,
            silver_price,
        }
    }

    pub fn gold_price(&self) -> f64 {
        self.gold_price
    }

    pub fn silver_price(&self) -> f64 {
        self.silver_price
    }

    /// Advance both metal prices by one step. `purchase_flow_tonnes` is
    /// the current annualized net central-bank gold buying in tonnes.
    pub fn advance(
        &mut self,
        tick: Tick,
        regime: Regime,
        risk_index: f64,
        purchase_flow_tonnes: f64,
        rng: &mut StdRng,
    ) -> SimResult<(f64, f64)> {
        let cfg = &self.config;
        let dt = self.dt;
        let vol_mult = if regime.is_crisis() {
            cfg.crisis_vol_multiplier
        } else {
            1.0
        };

        // Gold: anchored GBM with purchase-flow and safe-haven drift.
        let anchor_pull =
            -cfg.reversion_speed * (self.gold_price / cfg.long_term_gold_price).ln();
        let drift = cfg.gold_drift
            + anchor_pull
            + cfg.purchase_impact_per_kt * (purchase_flow_tonnes / 1000.0)
            + cfg.flight_to_safety * risk_index;
        let z_gold: f64 = StandardNormal.sample(rng);
        let gold_return = drift * dt + cfg.gold_volatility * vol_mult * dt.sqrt() * z_gold;
        let new_gold = self.gold_price * gold_return.exp();
        if !(new_gold.is_finite() && new_gold > 0.0) {
            return Err(SimError::Numerical {
                step: tick,
                quantity: "gold price".into(),
                value: new_gold,
            });
        }

        // Silver: mean-reverting log gold/silver ratio with a seasonal
        // industrial-demand swing.
        let steps_per_year = 1.0 / dt;
        let season = (std::f64::consts::TAU * tick as f64 / steps_per_year).sin();
        let target_log_ratio = cfg.ratio_target.ln() + cfg.seasonal_amplitude * season;
        let mut log_ratio = (new_gold / self.silver_price).ln();
        let z_ratio: f64 = StandardNormal.sample(rng);
        log_ratio += cfg.ratio_reversion_speed * (target_log_ratio - log_ratio) * dt
            + cfg.ratio_volatility * dt.sqrt() * z_ratio;
        let new_silver = new_gold / log_ratio.exp();
        if !(new_silver.is_finite() && new_silver > 0.0) {
            return Err(SimError::Numerical {
                step: tick,
                quantity: "silver price".into(),
                value: new_silver,
            });
        }

        self.gold_price = new_gold;
        self.silver_price = new_silver;
        Ok((new_gold, new_silver))
    }
}

// =============================================================================
// Tests
// =============================================================================
