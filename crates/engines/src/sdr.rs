//! SDR engine.
//!
//! Values the SDR as a fixed-weight basket of five reserve currencies and
//! tracks scheduled allocation events. Valuation is deterministic given
//! the step's exchange rates; the runner distributes allocation amounts
//! to agents by IMF quota share.

use serde::{Deserialize, Serialize};

use types::{Currency, FxRates, SimError, SimResult, Tick};

const BASKET: usize = Currency::SDR_BASKET.len();

// =============================================================================
// SdrConfig
// =============================================================================

/// Configuration for SDR valuation and allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdrConfig {
    /// Basket weights aligned with [`Currency::SDR_BASKET`]
    /// (USD, EUR, JPY, GBP, CNY). Must sum to 1.
    pub basket_weights: [f64; BASKET],

    /// Scheduled allocation events as `(step, amount_usd)` pairs,
    /// ascending by step.
    pub allocations: Vec<(Tick, f64)>,

    /// SDR stock outstanding at the start of the run, USD.
    pub initial_outstanding_usd: f64,
}

impl Default for SdrConfig {
    fn default() -> Self {
        Self {
            // 2022 basket review, rounded.
            basket_weights: [0.43, 0.29, 0.08, 0.07, 0.13],
            allocations: Vec::new(),
            initial_outstanding_usd: 660e9,
        }
    }
}

impl SdrConfig {
    pub fn validate(&self) -> SimResult<()> {
        let sum: f64 = self.basket_weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SimError::Config(format!(
                "SDR basket weights sum to {sum}, expected 1.0"
            )));
        }
        for (i, &w) in self.basket_weights.iter().enumerate() {
            if !(w.is_finite() && w >= 0.0) {
                return Err(SimError::Config(format!(
                    "SDR basket weight for {} is {w}",
                    Currency::SDR_BASKET[i]
                )));
            }
        }
        for &(step, amount) in &self.allocations {
            if !(amount.is_finite() && amount > 0.0) {
                return Err(SimError::Config(format!(
                    "SDR allocation at step {step} has non-positive amount {amount}"
                )));
            }
        }
        if self.initial_outstanding_usd < 0.0 {
            return Err(SimError::Config(format!(
                "initial SDR outstanding {} is negative",
                self.initial_outstanding_usd
            )));
        }
        Ok(())
    }

    pub fn weight_of(&self, currency: Currency) -> f64 {
        Currency::SDR_BASKET
            .iter()
            .position(|&c| c == currency)
            .map_or(0.0, |i| self.basket_weights[i])
    }

    pub fn with_allocation(mut self, step: Tick, amount_usd: f64) -> Self {
        self.allocations.push((step, amount_usd));
        self.allocations.sort_by_key(|&(step, _)| step);
        self
    }
}

// =============================================================================
// SdrEngine
// =============================================================================

/// Output of one SDR step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SdrOutput {
    /// SDR value in USD.
    pub value: f64,
    /// Allocation released this step, USD, if one was scheduled.
    pub allocation_usd: Option<f64>,
}

/// Basket valuation and scheduled-allocation tracking.
#[derive(Debug, Clone)]
pub struct SdrEngine {
    config: SdrConfig,
    /// Index of the next unreleased allocation.
    next_allocation: usize,
    outstanding_usd: f64,
}

impl SdrEngine {
    pub fn new(config: SdrConfig) -> Self {
        let outstanding_usd = config.initial_outstanding_usd;
        Self {
            config,
            next_allocation: 0,
            outstanding_usd,
        }
    }

    /// Cumulative SDR stock outstanding, USD.
    pub fn outstanding_usd(&self) -> f64 {
        self.outstanding_usd
    }

    /// Basket value in USD at the given rates.
    pub fn value(&self, rates: &FxRates) -> f64 {
        Currency::SDR_BASKET
            .iter()
            .zip(self.config.basket_weights.iter())
            .map(|(&c, &w)| w * rates.get(c))
            .sum()
    }

    /// Value the basket and release every allocation due by `tick`.
    /// Draining all entries with `step <= tick` means an entry scheduled
    /// before the first step, or several entries sharing a step, release
    /// together rather than wedging the queue.
    pub fn advance(&mut self, tick: Tick, rates: &FxRates) -> SimResult<SdrOutput> {
        let value = self.value(rates);
        if !(value.is_finite() && value > 0.0) {
            return Err(SimError::Numerical {
                step: tick,
                quantity: "SDR value".into(),
                value,
            });
        }

        let mut released = 0.0;
        while let Some(&(step, amount)) = self.config.allocations.get(self.next_allocation) {
            if step > tick {
                break;
            }
            self.next_allocation += 1;
            self.outstanding_usd += amount;
            released += amount;
        }

        Ok(SdrOutput {
            value,
            allocation_usd: (released > 0.0).then_some(released),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
