//! Scenario configuration: engine configs, agent policy, and roster,
//! with named presets mirroring the standard scenario set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use agents::{default_roster, validate_roster, BankSpec, ReservePolicy};
use engines::{FxConfig, MetalsConfig, RiskConfig, SdrConfig};
use types::{SimError, SimResult};

// =============================================================================
// StepFrequency
// =============================================================================

/// Granularity of a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl StepFrequency {
    /// Step length in years (365.25-day year).
    pub fn dt(self) -> f64 {
        match self {
            StepFrequency::Daily => 1.0 / 365.25,
            StepFrequency::Weekly => 7.0 / 365.25,
            StepFrequency::Monthly => 30.0 / 365.25,
        }
    }
}

impl FromStr for StepFrequency {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(StepFrequency::Daily),
            "weekly" => Ok(StepFrequency::Weekly),
            "monthly" => Ok(StepFrequency::Monthly),
            other => Err(SimError::Config(format!("unknown step frequency '{other}'"))),
        }
    }
}

// =============================================================================
// ScenarioConfig
// =============================================================================

/// Complete configuration of a run. Immutable once validated: the
/// [`crate::Simulation`] constructor takes it by value and never exposes
/// it mutably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub frequency: StepFrequency,
    /// Seed used when the caller does not supply one.
    pub default_seed: u64,
    pub risk: RiskConfig,
    pub fx: FxConfig,
    pub metals: MetalsConfig,
    pub sdr: SdrConfig,
    pub policy: ReservePolicy,
    pub roster: Vec<BankSpec>,
    /// Baseline net central-bank gold buying, tonnes per year. The
    /// effective flow each step also scales with the risk index.
    pub gold_purchases_tonnes_per_year: f64,
    /// Multiplier on mandate drift; de-dollarization scenarios raise it.
    pub mandate_drift_scale: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            frequency: StepFrequency::Daily,
            default_seed: 42,
            risk: RiskConfig::default(),
            fx: FxConfig::default(),
            metals: MetalsConfig::default(),
            sdr: SdrConfig::default(),
            policy: ReservePolicy::default(),
            roster: default_roster(),
            gold_purchases_tonnes_per_year: 1000.0,
            mandate_drift_scale: 1.0,
        }
    }
}

impl ScenarioConfig {
    /// Validate every component. Called once by the simulation
    /// constructor; any failure aborts before the first step.
    pub fn validate(&self) -> SimResult<()> {
        self.risk.validate()?;
        self.fx.validate()?;
        self.metals.validate()?;
        self.sdr.validate()?;
        self.policy.validate()?;
        validate_roster(&self.roster)?;
        if !self.gold_purchases_tonnes_per_year.is_finite() {
            return Err(SimError::Config(format!(
                "gold purchase flow {} is not finite",
                self.gold_purchases_tonnes_per_year
            )));
        }
        if !(self.mandate_drift_scale.is_finite() && self.mandate_drift_scale >= 0.0) {
            return Err(SimError::Config(format!(
                "mandate drift scale {} must be non-negative",
                self.mandate_drift_scale
            )));
        }
        Ok(())
    }

    pub fn dt(&self) -> f64 {
        self.frequency.dt()
    }

    pub fn with_frequency(mut self, frequency: StepFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.default_seed = seed;
        self
    }

    pub fn with_roster(mut self, roster: Vec<BankSpec>) -> Self {
        self.roster = roster;
        self
    }
}

// =============================================================================
// Scenario presets
// =============================================================================

/// Named scenario presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scenario {
    /// Calm markets, slow structural de-dollarization.
    #[default]
    Baseline,
    /// Elevated volatility, frequent shocks, defensive central banks.
    Crisis,
    /// Accelerated move away from USD reserves.
    Dedollarization,
    /// Inflation-driven precious-metal rally.
    InflationSurge,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Baseline,
        Scenario::Crisis,
        Scenario::Dedollarization,
        Scenario::InflationSurge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::Crisis => "crisis",
            Scenario::Dedollarization => "dedollarization",
            Scenario::InflationSurge => "inflation-surge",
        }
    }

    /// Build the preset configuration. Any field may be overridden before
    /// validation.
    pub fn config(self) -> ScenarioConfig {
        let base = ScenarioConfig::default();
        match self {
            Scenario::Baseline => base,
            Scenario::Crisis => ScenarioConfig {
                risk: RiskConfig::default()
                    .with_baseline(0.8)
                    .with_jump_intensity(6.0),
                fx: FxConfig {
                    // EUR, JPY, GBP, CNY, CHF, CAD, AUD
                    volatility: [0.25, 0.20, 0.30, 0.15, 0.18, 0.28, 0.35],
                    ..FxConfig::default()
                },
                metals: MetalsConfig {
                    gold_volatility: 0.40,
                    ratio_volatility: 0.30,
                    flight_to_safety: 0.2,
                    ..MetalsConfig::default()
                },
                policy: ReservePolicy {
                    intervention_probability: 0.15,
                    intervention_strength: 1.2,
                    liquidation_fraction: 0.15,
                    ..ReservePolicy::default()
                },
                gold_purchases_tonnes_per_year: 1500.0,
                ..base
            },
            Scenario::Dedollarization => ScenarioConfig {
                fx: FxConfig::default().with_usd_dominance_decline(0.02),
                // One allocation after half a year, +15% of the stock.
                sdr: SdrConfig::default().with_allocation(183, 0.15 * 660e9),
                policy: ReservePolicy {
                    intervention_strength: 0.6,
                    ..ReservePolicy::default()
                },
                gold_purchases_tonnes_per_year: 1800.0,
                mandate_drift_scale: 3.0,
                ..base
            },
            Scenario::InflationSurge => ScenarioConfig {
                metals: MetalsConfig {
                    long_term_gold_price: 3500.0,
                    ratio_target: 3500.0 / 45.0,
                    reversion_speed: 0.5,
                    purchase_impact_per_kt: 0.04,
                    flight_to_safety: 0.2,
                    ..MetalsConfig::default()
                },
                policy: ReservePolicy {
                    intervention_strength: 0.9,
                    ..ReservePolicy::default()
                },
                gold_purchases_tonnes_per_year: 2000.0,
                ..base
            },
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "default" => Ok(Scenario::Baseline),
            "crisis" => Ok(Scenario::Crisis),
            "dedollarization" | "dedollarisation" => Ok(Scenario::Dedollarization),
            "inflation-surge" | "inflation_surge" | "inflation" => Ok(Scenario::InflationSurge),
            other => Err(SimError::Config(format!("unknown scenario '{other}'"))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use types::{AssetClass, Currency};

    #[test]
    fn test_all_presets_validate() {
        for scenario in Scenario::ALL {
            scenario
                .config()
                .validate()
                .unwrap_or_else(|e| panic!("{scenario} preset invalid: {e}"));
        }
    }

    #[test]
    fn test_frequency_dt() {
        assert!((StepFrequency::Daily.dt() - 1.0 / 365.25).abs() < 1e-15);
        assert!(StepFrequency::Monthly.dt() > StepFrequency::Weekly.dt());
        assert_eq!("weekly".parse::<StepFrequency>().unwrap(), StepFrequency::Weekly);
        assert!("hourly".parse::<StepFrequency>().is_err());
    }

    #[test]
    fn test_crisis_preset_is_more_volatile() {
        let baseline = Scenario::Baseline.config();
        let crisis = Scenario::Crisis.config();
        assert!(
            crisis.fx.volatility_of(Currency::Eur) > baseline.fx.volatility_of(Currency::Eur)
        );
        assert!(crisis.risk.baseline > baseline.risk.baseline);
        assert!(crisis.metals.gold_volatility > baseline.metals.gold_volatility);
    }

    #[test]
    fn test_dedollarization_preset_schedules_allocation() {
        let config = Scenario::Dedollarization.config();
        assert_eq!(config.sdr.allocations.len(), 1);
        assert!(config.mandate_drift_scale > 1.0);
        assert!(config.fx.usd_dominance_decline_rate > 0.01);
    }

    #[test]
    fn test_scenario_round_trips_from_str() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
        }
        assert!("martian-invasion".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_validate_surfaces_component_errors() {
        let mut config = ScenarioConfig::default();
        config.policy.target_weights[AssetClass::Usd as usize] = 0.9;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::default();
        config.roster.clear();
        assert!(config.validate().is_err());
    }
}
