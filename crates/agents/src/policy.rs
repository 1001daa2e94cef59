//! Shared reserve-management policy parameters.

use serde::{Deserialize, Serialize};

use types::{AssetClass, SimError, SimResult};

/// Policy parameters shared by every agent in a run. Per-agent variation
/// (risk tolerance, quota share, reserves) lives in [`crate::BankSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservePolicy {
    /// Initial mandate targets over [`AssetClass::ALL`]. Must sum to 1.
    pub target_weights: [f64; AssetClass::ALL.len()],

    /// Any |weight - target| above this triggers a rebalance.
    pub rebalancing_threshold: f64,

    /// Fraction of each deviation closed per rebalance.
    pub participation_rate: f64,

    /// Risk-index level above which stress liquidation fires.
    pub stress_threshold: f64,

    /// Fraction of the liquidated bucket shifted into USD under stress.
    pub liquidation_fraction: f64,

    /// Per-step intervention probability once the band is breached.
    pub intervention_probability: f64,

    /// Multiplier on the intervention probability under Crisis.
    pub crisis_intervention_multiplier: f64,

    /// Relative move in the domestic rate since the last intervention
    /// that arms a new one.
    pub intervention_band: f64,

    /// Annualized drift impulse of an intervention.
    pub intervention_strength: f64,

    /// Annual accrual rate of the securities bucket.
    pub securities_yield: f64,

    /// Annual mandate-target drift toward gold.
    pub mandate_gold_drift: f64,

    /// Annual mandate-target drift toward CNY. Both drifts come out of
    /// the USD target.
    pub mandate_cny_drift: f64,
}

impl Default for ReservePolicy {
    fn default() -> Self {
        let mut target_weights = [0.0; AssetClass::ALL.len()];
        target_weights[AssetClass::Usd as usize] = 0.55;
        target_weights[AssetClass::Eur as usize] = 0.19;
        target_weights[AssetClass::Jpy as usize] = 0.06;
        target_weights[AssetClass::Gbp as usize] = 0.05;
        target_weights[AssetClass::Cny as usize] = 0.03;
        target_weights[AssetClass::Gold as usize] = 0.05;
        target_weights[AssetClass::Sdr as usize] = 0.02;
        target_weights[AssetClass::Securities as usize] = 0.05;
        Self {
            target_weights,
            rebalancing_threshold: 0.05,
            participation_rate: 0.2,
            stress_threshold: 0.75,
            liquidation_fraction: 0.10,
            intervention_probability: 0.05,
            crisis_intervention_multiplier: 3.0,
            intervention_band: 0.05,
            intervention_strength: 0.5,
            securities_yield: 0.03,
            mandate_gold_drift: 0.005,
            mandate_cny_drift: 0.003,
        }
    }
}

impl ReservePolicy {
    pub fn validate(&self) -> SimResult<()> {
        let sum: f64 = self.target_weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SimError::Config(format!(
                "target weights sum to {sum}, expected 1.0"
            )));
        }
        for (i, &w) in self.target_weights.iter().enumerate() {
            if !(w.is_finite() && w >= 0.0) {
                return Err(SimError::Config(format!(
                    "target weight for {} is {w}",
                    AssetClass::ALL[i]
                )));
            }
        }
        for (name, p) in [
            ("intervention probability", self.intervention_probability),
            ("participation rate", self.participation_rate),
            ("liquidation fraction", self.liquidation_fraction),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::Config(format!("{name} {p} is outside [0, 1]")));
            }
        }
        if !(0.0..=1.0).contains(&self.stress_threshold) {
            return Err(SimError::Config(format!(
                "stress threshold {} is outside [0, 1]",
                self.stress_threshold
            )));
        }
        for (name, v) in [
            ("rebalancing threshold", self.rebalancing_threshold),
            ("intervention band", self.intervention_band),
            ("intervention strength", self.intervention_strength),
            ("crisis intervention multiplier", self.crisis_intervention_multiplier),
            ("securities yield", self.securities_yield),
            ("mandate gold drift", self.mandate_gold_drift),
            ("mandate CNY drift", self.mandate_cny_drift),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SimError::Config(format!("{name} {v} must be non-negative")));
            }
        }
        Ok(())
    }

    pub fn with_rebalancing_threshold(mut self, threshold: f64) -> Self {
        self.rebalancing_threshold = threshold;
        self
    }

    pub fn with_intervention_probability(mut self, probability: f64) -> Self {
        self.intervention_probability = probability;
        self
    }

    pub fn with_target_weight(mut self, asset: AssetClass, weight: f64) -> Self {
        self.target_weights[asset as usize] = weight;
        self
    }
}
