//! Exchange-rate engine.
//!
//! Evolves non-base rates in log space with correlated Gaussian shocks.
//! One vector of iid standard normals is drawn per step in canonical
//! currency order and correlated through the cached Cholesky factor, so
//! the cross-currency correlation structure is exact regardless of the
//! regime volatility scaling.

use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use types::{
    CorrelationMatrix, Currency, FxRates, Intervention, Regime, SimError, SimResult, Tick,
};

const N: usize = Currency::NON_BASE.len();

/// Extra de-dollarization drift applied while the regime is Crisis.
const CRISIS_DOMINANCE_MULTIPLIER: f64 = 2.0;

// =============================================================================
// FxConfig
// =============================================================================

/// Configuration for the exchange-rate process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConfig {
    /// Initial rates, USD per unit, canonical [`Currency::NON_BASE`] order.
    pub initial_rates: [f64; N],

    /// Annualized volatility per currency, canonical order.
    pub volatility: [f64; N],

    /// Annualized base drift per currency, canonical order.
    pub base_drift: [f64; N],

    /// Annual rate at which non-USD currencies appreciate against USD
    /// (structural erosion of dollar dominance). Doubled under Crisis.
    pub usd_dominance_decline_rate: f64,

    /// Volatility multiplier applied to every currency under Crisis.
    pub crisis_vol_multiplier: f64,

    /// Risk level at which the safe-haven adjustment is neutral.
    pub risk_neutral: f64,

    /// Drift gained by safe havens (CHF, JPY) per unit of excess risk.
    pub safe_haven_coeff: f64,

    /// Drift lost by the remaining currencies per unit of excess risk.
    pub risk_currency_coeff: f64,

    /// Cross-currency correlation structure.
    pub correlation: CorrelationMatrix,

    /// Per-step multiplicative decay of an intervention's drift impulse.
    pub intervention_decay: f64,

    /// Steps an intervention impulse persists before it is dropped.
    pub intervention_duration: u32,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            // EUR, JPY, GBP, CNY, CHF, CAD, AUD
            initial_rates: [
                1.12,
                1.0 / 110.0,
                1.31,
                1.0 / 6.45,
                1.0 / 0.92,
                1.0 / 1.25,
                0.75,
            ],
            volatility: [0.08, 0.10, 0.12, 0.06, 0.09, 0.11, 0.14],
            base_drift: [0.001, -0.005, 0.0, 0.02, 0.0, 0.0, 0.0],
            usd_dominance_decline_rate: 0.005,
            crisis_vol_multiplier: 2.5,
            risk_neutral: 0.3,
            safe_haven_coeff: 0.1,
            risk_currency_coeff: 0.05,
            correlation: default_market_correlation(),
            intervention_decay: 0.5,
            intervention_duration: 5,
        }
    }
}

impl FxConfig {
    pub fn validate(&self) -> SimResult<()> {
        for (i, &c) in Currency::NON_BASE.iter().enumerate() {
            if self.volatility[i] < 0.0 {
                return Err(SimError::Config(format!(
                    "{c} volatility {} is negative",
                    self.volatility[i]
                )));
            }
            if !(self.initial_rates[i].is_finite() && self.initial_rates[i] > 0.0) {
                return Err(SimError::Config(format!(
                    "{c} initial rate {} is not positive",
                    self.initial_rates[i]
                )));
            }
        }
        if self.crisis_vol_multiplier < 1.0 {
            return Err(SimError::Config(format!(
                "crisis volatility multiplier {} must be at least 1",
                self.crisis_vol_multiplier
            )));
        }
        if !(0.0 < self.intervention_decay && self.intervention_decay <= 1.0) {
            return Err(SimError::Config(format!(
                "intervention decay {} must be in (0, 1]",
                self.intervention_decay
            )));
        }
        if self.intervention_duration == 0 {
            return Err(SimError::Config(
                "intervention duration must be at least one step".into(),
            ));
        }
        Ok(())
    }

    pub fn volatility_of(&self, currency: Currency) -> f64 {
        currency
            .non_base_index()
            .map_or(0.0, |i| self.volatility[i])
    }

    pub fn with_volatility(mut self, currency: Currency, vol: f64) -> Self {
        if let Some(i) = currency.non_base_index() {
            self.volatility[i] = vol;
        }
        self
    }

    pub fn with_usd_dominance_decline(mut self, rate: f64) -> Self {
        self.usd_dominance_decline_rate = rate;
        self
    }

    fn is_safe_haven(currency: Currency) -> bool {
        matches!(currency, Currency::Chf | Currency::Jpy)
    }
}

/// The stylized reserve-currency correlation structure: tight EUR/CHF and
/// EUR/GBP links, a commodity bloc (CAD/AUD), weak CNY links, and a low
/// default correlation everywhere else.
fn default_market_correlation() -> CorrelationMatrix {
    use Currency::*;
    CorrelationMatrix::from_pairs(
        &[
            (Eur, Gbp, 0.65),
            (Eur, Jpy, 0.25),
            (Eur, Cny, 0.15),
            (Eur, Chf, 0.85),
            (Eur, Cad, 0.45),
            (Eur, Aud, 0.35),
            (Gbp, Jpy, 0.20),
            (Gbp, Chf, 0.55),
            (Gbp, Cad, 0.40),
            (Gbp, Aud, 0.50),
            (Jpy, Cny, 0.30),
            (Jpy, Chf, 0.15),
            (Jpy, Cad, 0.25),
            (Jpy, Aud, 0.35),
            (Cny, Chf, 0.05),
            (Cny, Cad, 0.20),
            (Cny, Aud, 0.25),
            (Chf, Cad, 0.30),
            (Chf, Aud, 0.25),
            (Cad, Aud, 0.60),
        ],
        0.1,
    )
    .expect("default correlation table is symmetric and positive semidefinite")
}

// =============================================================================
// FxEngine
// =============================================================================

/// A decaying drift impulse from a past intervention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct InterventionImpact {
    currency: Currency,
    drift: f64,
    remaining: u32,
}

/// Correlated log-space exchange-rate process.
#[derive(Debug, Clone)]
pub struct FxEngine {
    config: FxConfig,
    dt: f64,
    rates: FxRates,
    impacts: SmallVec<[InterventionImpact; 4]>,
}

impl FxEngine {
    pub fn new(config: FxConfig, dt: f64) -> Self {
        let rates = FxRates::from_fn(|c| {
            c.non_base_index()
                .map_or(1.0, |i| config.initial_rates[i])
        });
        Self {
            config,
            dt,
            rates,
            impacts: SmallVec::new(),
        }
    }

    pub fn rates(&self) -> &FxRates {
        &self.rates
    }

    /// Queue an intervention flagged this step; its drift impulse applies
    /// from the next [`advance`](Self::advance) call onward.
    pub fn submit_intervention(&mut self, intervention: Intervention) {
        self.impacts.push(InterventionImpact {
            currency: intervention.currency,
            drift: intervention.direction * intervention.strength,
            remaining: self.config.intervention_duration,
        });
    }

    /// Advance all non-base rates by one step.
    pub fn advance(
        &mut self,
        tick: Tick,
        regime: Regime,
        risk_index: f64,
        rng: &mut StdRng,
    ) -> SimResult<FxRates> {
        let cfg = &self.config;
        let dt = self.dt;
        let vol_mult = if regime.is_crisis() {
            cfg.crisis_vol_multiplier
        } else {
            1.0
        };
        let dominance_mult = if regime.is_crisis() {
            CRISIS_DOMINANCE_MULTIPLIER
        } else {
            1.0
        };
        let excess_risk = risk_index - cfg.risk_neutral;

        // One draw per currency, canonical order, then correlate.
        let mut z = [0.0; N];
        for zi in &mut z {
            *zi = StandardNormal.sample(rng);
        }
        let shocks = cfg.correlation.correlate(&z);

        for (i, &currency) in Currency::NON_BASE.iter().enumerate() {
            let mut drift = cfg.base_drift[i]
                + cfg.usd_dominance_decline_rate * dominance_mult;
            drift += if FxConfig::is_safe_haven(currency) {
                cfg.safe_haven_coeff * excess_risk
            } else {
                -cfg.risk_currency_coeff * excess_risk
            };
            drift += self
                .impacts
                .iter()
                .filter(|imp| imp.currency == currency)
                .map(|imp| imp.drift)
                .sum::<f64>();

            let sigma = cfg.volatility[i] * vol_mult;
            let log_return = drift * dt + sigma * dt.sqrt() * shocks[i];
            let new_rate = self.rates.get(currency) * log_return.exp();

            if !(new_rate.is_finite() && new_rate > 0.0) {
                return Err(SimError::Numerical {
                    step: tick,
                    quantity: format!("{currency} rate"),
                    value: new_rate,
                });
            }
            self.rates.set(currency, new_rate);
        }

        // Decay the applied impulses and drop the expired ones.
        for impact in &mut self.impacts {
            impact.drift *= self.config.intervention_decay;
            impact.remaining -= 1;
        }
        self.impacts.retain(|imp| imp.remaining > 0);

        Ok(self.rates.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn run_rates(
        config: FxConfig,
        regime: Regime,
        seed: u64,
        steps: u64,
    ) -> Vec<FxRates> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut engine = FxEngine::new(config, 1.0 / 365.25);
        (0..steps)
            .map(|t| engine.advance(t, regime, 0.3, &mut rng).unwrap())
            .collect()
    }

    fn log_returns(series: &[f64]) -> Vec<f64> {
        series.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
    }

    fn variance(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_deterministic_path() {
        let a = run_rates(FxConfig::default(), Regime::Calm, 42, 300);
        let b = run_rates(FxConfig::default(), Regime::Calm, 42, 300);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rates_stay_positive() {
        for rates in run_rates(FxConfig::default(), Regime::Crisis, 9, 5000) {
            for (_, rate) in rates.iter_non_base() {
                assert!(rate.is_finite() && rate > 0.0);
            }
        }
    }

    #[test]
    fn test_crisis_variance_ratio() {
        // Same seed means the same normal draws, so the log-return
        // variance ratio should sit near the squared multiplier.
        let calm = run_rates(FxConfig::default(), Regime::Calm, 11, 2000);
        let crisis = run_rates(FxConfig::default(), Regime::Crisis, 11, 2000);

        let calm_eur: Vec<f64> = calm.iter().map(|r| r.get(Currency::Eur)).collect();
        let crisis_eur: Vec<f64> = crisis.iter().map(|r| r.get(Currency::Eur)).collect();
        let ratio = variance(&log_returns(&crisis_eur)) / variance(&log_returns(&calm_eur));

        let expected = 2.5_f64.powi(2);
        assert!(
            (ratio - expected).abs() < expected * 0.2,
            "variance ratio {ratio}, expected about {expected}"
        );
    }

    #[test]
    fn test_correlation_fidelity() {
        let rates = run_rates(FxConfig::default(), Regime::Calm, 21, 10_000);
        let eur: Vec<f64> = rates.iter().map(|r| r.get(Currency::Eur)).collect();
        let chf: Vec<f64> = rates.iter().map(|r| r.get(Currency::Chf)).collect();

        let x = log_returns(&eur);
        let y = log_returns(&chf);
        let mean_x = x.iter().sum::<f64>() / x.len() as f64;
        let mean_y = y.iter().sum::<f64>() / y.len() as f64;
        let cov: f64 = x
            .iter()
            .zip(&y)
            .map(|(a, b)| (a - mean_x) * (b - mean_y))
            .sum::<f64>()
            / x.len() as f64;
        let corr = cov / (variance(&x).sqrt() * variance(&y).sqrt());

        assert!(
            (corr - 0.85).abs() < 0.05,
            "EUR/CHF sample correlation {corr}, configured 0.85"
        );
    }

    #[test]
    fn test_intervention_raises_rate_then_decays() {
        // No noise, no drift: the only force on EUR is the intervention.
        let config = FxConfig {
            volatility: [0.0; N],
            base_drift: [0.0; N],
            usd_dominance_decline_rate: 0.0,
            safe_haven_coeff: 0.0,
            risk_currency_coeff: 0.0,
            ..FxConfig::default()
        };
        let duration = config.intervention_duration as u64;
        let mut rng = StdRng::seed_from_u64(1);
        let mut engine = FxEngine::new(config, 1.0 / 365.25);
        engine.submit_intervention(Intervention {
            currency: Currency::Eur,
            direction: 1.0,
            strength: 10.0,
        });

        let start = engine.rates().get(Currency::Eur);
        let mut previous = start;
        for t in 0..duration {
            let rates = engine.advance(t, Regime::Calm, 0.3, &mut rng).unwrap();
            assert!(rates.get(Currency::Eur) > previous, "step {t} should push up");
            previous = rates.get(Currency::Eur);
        }

        // Impulse expired: the rate no longer moves.
        let rates = engine
            .advance(duration, Regime::Calm, 0.3, &mut rng)
            .unwrap();
        assert!((rates.get(Currency::Eur) - previous).abs() < 1e-15);
    }

    #[test]
    fn test_default_correlation_table_constructs() {
        // Construction panics if an edit makes the table invalid.
        let m = default_market_correlation();
        assert_eq!(m.get(Currency::Eur, Currency::Chf), 0.85);
        assert_eq!(m.get(Currency::Cad, Currency::Aud), 0.60);
        assert_eq!(m.get(Currency::Jpy, Currency::Gbp), 0.20);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let bad = FxConfig::default().with_volatility(Currency::Eur, -0.1);
        assert!(bad.validate().is_err());

        let mut bad = FxConfig::default();
        bad.initial_rates[0] = 0.0;
        assert!(bad.validate().is_err());

        let bad = FxConfig {
            intervention_decay: 0.0,
            ..FxConfig::default()
        };
        assert!(bad.validate().is_err());

        assert!(FxConfig::default().validate().is_ok());
    }
}
