//! Core types for the ReserveFlow simulation.
//!
//! This crate provides the shared data types used across the simulation:
//! currency and asset-class enums, the per-step market state, the
//! correlation matrix with its Cholesky factorization, and the error
//! taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

mod correlation;
mod error;
mod snapshot;

pub use correlation::CorrelationMatrix;
pub use error::{SimError, SimResult};
pub use snapshot::{SimulationResult, StepSnapshot};

// =============================================================================
// Time Types
// =============================================================================

/// Discrete simulation step number.
pub type Tick = u64;

// =============================================================================
// Currency
// =============================================================================

/// Reserve currencies tracked by the simulation. USD is the base currency:
/// every exchange rate is quoted as USD per one unit of the currency.
///
/// The enum order is the canonical order. All random draws and all
/// per-currency iteration happen in this order, which is what makes runs
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Jpy,
    Gbp,
    Cny,
    Chf,
    Cad,
    Aud,
}

impl Currency {
    /// All currencies in canonical order.
    pub const ALL: [Currency; 8] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Jpy,
        Currency::Gbp,
        Currency::Cny,
        Currency::Chf,
        Currency::Cad,
        Currency::Aud,
    ];

    /// Non-base currencies (everything except USD), canonical order.
    /// This is the set the FX engine simulates.
    pub const NON_BASE: [Currency; 7] = [
        Currency::Eur,
        Currency::Jpy,
        Currency::Gbp,
        Currency::Cny,
        Currency::Chf,
        Currency::Cad,
        Currency::Aud,
    ];

    /// The five SDR basket currencies, canonical order.
    pub const SDR_BASKET: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Jpy,
        Currency::Gbp,
        Currency::Cny,
    ];

    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
            Currency::Gbp => "GBP",
            Currency::Cny => "CNY",
            Currency::Chf => "CHF",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }

    /// Whether this is the base currency (USD).
    pub fn is_base(self) -> bool {
        self == Currency::Usd
    }

    /// Index of a non-base currency within [`Currency::NON_BASE`].
    /// Returns `None` for USD.
    pub fn non_base_index(self) -> Option<usize> {
        Currency::NON_BASE.iter().position(|&c| c == self)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// AssetClass
// =============================================================================

/// Asset classes a central bank allocates reserves across.
///
/// `Securities` is the residual bucket (government securities and similar
/// instruments) and sits at the top of the liquidity ladder: under stress
/// it is liquidated before gold, and gold before strategic FX holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetClass {
    Usd,
    Eur,
    Jpy,
    Gbp,
    Cny,
    Gold,
    Sdr,
    Securities,
}

impl AssetClass {
    /// All asset classes in canonical order.
    pub const ALL: [AssetClass; 8] = [
        AssetClass::Usd,
        AssetClass::Eur,
        AssetClass::Jpy,
        AssetClass::Gbp,
        AssetClass::Cny,
        AssetClass::Gold,
        AssetClass::Sdr,
        AssetClass::Securities,
    ];

    /// The underlying currency, for FX-denominated asset classes.
    pub fn currency(self) -> Option<Currency> {
        match self {
            AssetClass::Usd => Some(Currency::Usd),
            AssetClass::Eur => Some(Currency::Eur),
            AssetClass::Jpy => Some(Currency::Jpy),
            AssetClass::Gbp => Some(Currency::Gbp),
            AssetClass::Cny => Some(Currency::Cny),
            AssetClass::Gold | AssetClass::Sdr | AssetClass::Securities => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetClass::Usd => "USD",
            AssetClass::Eur => "EUR",
            AssetClass::Jpy => "JPY",
            AssetClass::Gbp => "GBP",
            AssetClass::Cny => "CNY",
            AssetClass::Gold => "gold",
            AssetClass::Sdr => "SDR",
            AssetClass::Securities => "securities",
        }
    }
}

/// Portfolio weights over [`AssetClass::ALL`], canonical order.
pub type ReserveWeights = [f64; AssetClass::ALL.len()];

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Regime
// =============================================================================

/// Discrete volatility regime governing stochastic-process parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Regime {
    #[default]
    Calm,
    Crisis,
}

impl Regime {
    pub fn is_crisis(self) -> bool {
        self == Regime::Crisis
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Calm => write!(f, "calm"),
            Regime::Crisis => write!(f, "crisis"),
        }
    }
}

// =============================================================================
// FxRates
// =============================================================================

/// Per-currency exchange rates, quoted as USD per one unit of currency.
///
/// Stored as a fixed array indexed by canonical currency order so that
/// iteration order never depends on hash state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRates {
    rates: [f64; Currency::ALL.len()],
}

impl FxRates {
    /// Build from a closure over all currencies. USD is pinned at 1.0.
    pub fn from_fn(mut f: impl FnMut(Currency) -> f64) -> Self {
        let mut rates = [1.0; Currency::ALL.len()];
        for (i, &c) in Currency::ALL.iter().enumerate() {
            rates[i] = if c.is_base() { 1.0 } else { f(c) };
        }
        Self { rates }
    }

    /// USD value of one unit of `currency`.
    pub fn get(&self, currency: Currency) -> f64 {
        self.rates[currency as usize]
    }

    /// Set a non-base rate. Setting USD is a no-op.
    pub fn set(&mut self, currency: Currency, rate: f64) {
        if !currency.is_base() {
            self.rates[currency as usize] = rate;
        }
    }

    /// Iterate non-base rates in canonical order.
    pub fn iter_non_base(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        Currency::NON_BASE.iter().map(|&c| (c, self.get(c)))
    }

    /// Simplified trade-weighted USD index, equal weights over EUR, JPY,
    /// GBP, and CNY, normalized to 100.0 at the reference rates.
    pub fn usd_index(&self, reference: &FxRates) -> f64 {
        let basket = [Currency::Eur, Currency::Jpy, Currency::Gbp, Currency::Cny];
        let strength: f64 = basket
            .iter()
            .map(|&c| reference.get(c) / self.get(c))
            .sum::<f64>()
            / basket.len() as f64;
        100.0 * strength
    }
}

// =============================================================================
// Intervention
// =============================================================================

/// An FX intervention flagged by a central bank. Produced by the agent
/// layer at step t and consumed by the FX engine at step t + 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    /// Currency being defended.
    pub currency: Currency,
    /// +1.0 to push the rate up (support the currency), -1.0 to push it
    /// down. Always opposes the move that triggered the intervention.
    pub direction: f64,
    /// Annualized drift impulse magnitude.
    pub strength: f64,
}

// =============================================================================
// MarketState
// =============================================================================

/// The shared market snapshot, written exactly once per step in dependency
/// order: risk, then FX, then metals, then SDR. Agents only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Step this state belongs to.
    pub tick: Tick,
    /// Exchange rates, USD per unit.
    pub rates: FxRates,
    /// Current volatility regime.
    pub regime: Regime,
    /// Geopolitical risk index in [0, 1].
    pub risk_index: f64,
    /// Whether a geopolitical jump event fired this step.
    pub event_occurred: bool,
    /// Gold price, USD per troy ounce.
    pub gold_price: f64,
    /// Silver price, USD per troy ounce.
    pub silver_price: f64,
    /// SDR value in USD.
    pub sdr_value: f64,
}

impl MarketState {
    /// Gold/silver price ratio.
    pub fn gold_silver_ratio(&self) -> f64 {
        self.gold_price / self.silver_price
    }

    /// USD value of one unit of the given asset class: the FX rate for
    /// currency buckets, spot for gold and SDR, 1.0 for USD and securities.
    pub fn unit_value(&self, asset: AssetClass) -> f64 {
        match asset {
            AssetClass::Gold => self.gold_price,
            AssetClass::Sdr => self.sdr_value,
            AssetClass::Securities => 1.0,
            other => other.currency().map_or(1.0, |c| self.rates.get(c)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
