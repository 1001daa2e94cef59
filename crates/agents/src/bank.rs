//! The central-bank agent: portfolio state and per-step decisions.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use types::{AssetClass, Currency, Intervention, MarketState, ReserveWeights};

use crate::policy::ReservePolicy;

const ASSETS: usize = AssetClass::ALL.len();

/// Outcome of one agent decision step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decision {
    pub rebalanced: bool,
    pub liquidated: bool,
    pub intervention: Option<Intervention>,
}

/// One central bank's reserve portfolio and decision state.
///
/// Weights are non-negative and sum to 1 (within 1e-9) after every
/// public method; every mutation ends in a renormalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralBankAgent {
    pub id: u32,
    pub name: String,
    /// Currency this bank defends. USD-domiciled banks never intervene.
    pub domestic_currency: Currency,
    pub total_reserves_usd: f64,
    /// Current portfolio weights over [`AssetClass::ALL`].
    pub weights: [f64; ASSETS],
    /// Mandate targets, drifting over the run.
    pub targets: [f64; ASSETS],
    /// Risk-index level that forces this bank to rebalance.
    pub risk_tolerance: f64,
    /// Share of IMF quota, used to split SDR allocations.
    pub quota_share: f64,
    /// Cleared on depletion; a depleted bank never re-enters.
    pub active: bool,
    /// Domestic rate at the last intervention (or at construction).
    last_intervention_rate: f64,
}

impl CentralBankAgent {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        domestic_currency: Currency,
        initial_reserves_usd: f64,
        risk_tolerance: f64,
        quota_share: f64,
        policy: &ReservePolicy,
        initial_domestic_rate: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            domestic_currency,
            total_reserves_usd: initial_reserves_usd,
            weights: policy.target_weights,
            targets: policy.target_weights,
            risk_tolerance,
            quota_share,
            active: true,
            last_intervention_rate: initial_domestic_rate,
        }
    }

    /// USD value currently held in `asset`.
    pub fn holding_usd(&self, asset: AssetClass) -> f64 {
        self.total_reserves_usd * self.weights[asset as usize]
    }

    /// Revalue every bucket at the new step's prices. FX, gold, and SDR
    /// buckets move with their price ratios; securities accrue yield;
    /// USD is the numeraire. Depletion deactivates the bank and warns.
    pub fn revalue(
        &mut self,
        prev: &MarketState,
        now: &MarketState,
        policy: &ReservePolicy,
        dt: f64,
    ) {
        if !self.active {
            return;
        }

        let mut values = [0.0; ASSETS];
        for (i, &asset) in AssetClass::ALL.iter().enumerate() {
            let growth = match asset {
                AssetClass::Usd => 1.0,
                AssetClass::Securities => 1.0 + policy.securities_yield * dt,
                other => now.unit_value(other) / prev.unit_value(other),
            };
            values[i] = self.total_reserves_usd * self.weights[i] * growth;
        }
        let total: f64 = values.iter().sum();

        if !(total.is_finite() && total > 0.0) {
            warn!(
                agent = %self.name,
                step = now.tick,
                total,
                "reserves depleted, deactivating agent"
            );
            self.total_reserves_usd = 0.0;
            self.active = false;
            return;
        }

        self.total_reserves_usd = total;
        for (w, v) in self.weights.iter_mut().zip(values.iter()) {
            *w = v / total;
        }
    }

    /// Shift mandate targets toward gold and CNY at the expense of USD.
    /// `scale` lets scenarios accelerate the shift.
    pub fn drift_mandate(&mut self, policy: &ReservePolicy, dt: f64, scale: f64) {
        if !self.active {
            return;
        }
        let gold_shift = policy.mandate_gold_drift * scale * dt;
        let cny_shift = policy.mandate_cny_drift * scale * dt;
        self.targets[AssetClass::Gold as usize] += gold_shift;
        self.targets[AssetClass::Cny as usize] += cny_shift;
        let usd = &mut self.targets[AssetClass::Usd as usize];
        *usd = (*usd - gold_shift - cny_shift).max(0.0);
        normalize(&mut self.targets);
    }

    /// Per-step decision: stress liquidation, threshold rebalancing, and
    /// the intervention roll, in that order.
    pub fn decide(
        &mut self,
        market: &MarketState,
        policy: &ReservePolicy,
        rng: &mut StdRng,
    ) -> Decision {
        if !self.active {
            return Decision::default();
        }

        let mut decision = Decision::default();

        if market.risk_index > policy.stress_threshold {
            self.liquidate_for_stress(policy);
            decision.liquidated = true;
        }

        let max_deviation = self
            .weights
            .iter()
            .zip(self.targets.iter())
            .map(|(w, t)| (w - t).abs())
            .fold(0.0, f64::max);
        if max_deviation > policy.rebalancing_threshold
            || market.risk_index > self.risk_tolerance
        {
            self.rebalance(policy);
            decision.rebalanced = true;
        }

        decision.intervention = self.consider_intervention(market, policy, rng);
        decision
    }

    /// Move each weight `participation_rate` of the way to its target,
    /// largest deviation first.
    fn rebalance(&mut self, policy: &ReservePolicy) {
        let mut order: [usize; ASSETS] = std::array::from_fn(|i| i);
        order.sort_by(|&a, &b| {
            let da = (self.weights[a] - self.targets[a]).abs();
            let db = (self.weights[b] - self.targets[b]).abs();
            db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
        });
        for i in order {
            self.weights[i] += policy.participation_rate * (self.targets[i] - self.weights[i]);
            self.weights[i] = self.weights[i].max(0.0);
        }
        normalize(&mut self.weights);
    }

    /// Liquidity ladder: securities first, gold once securities are gone,
    /// proceeds into USD.
    fn liquidate_for_stress(&mut self, policy: &ReservePolicy) {
        let securities = AssetClass::Securities as usize;
        let gold = AssetClass::Gold as usize;
        let source = if self.weights[securities] > 1e-12 {
            securities
        } else {
            gold
        };
        let shifted = policy.liquidation_fraction * self.weights[source];
        self.weights[source] -= shifted;
        self.weights[AssetClass::Usd as usize] += shifted;
        normalize(&mut self.weights);
    }

    /// Roll for an intervention once the domestic rate has moved beyond
    /// the band since the last one. The direction opposes the move.
    fn consider_intervention(
        &mut self,
        market: &MarketState,
        policy: &ReservePolicy,
        rng: &mut StdRng,
    ) -> Option<Intervention> {
        if self.domestic_currency.is_base() {
            return None;
        }
        let rate = market.rates.get(self.domestic_currency);
        let relative_move = (rate - self.last_intervention_rate) / self.last_intervention_rate;
        if relative_move.abs() <= policy.intervention_band {
            return None;
        }

        let mut probability = policy.intervention_probability;
        if market.regime.is_crisis() {
            probability *= policy.crisis_intervention_multiplier;
        }
        if !rng.random_bool(probability.min(1.0)) {
            return None;
        }

        self.last_intervention_rate = rate;
        Some(Intervention {
            currency: self.domestic_currency,
            direction: -relative_move.signum(),
            strength: policy.intervention_strength,
        })
    }

    /// Credit an SDR allocation: reserves grow and the SDR bucket absorbs
    /// the full amount.
    pub fn receive_sdr_allocation(&mut self, amount_usd: f64) {
        if !self.active || amount_usd <= 0.0 {
            return;
        }
        let old_total = self.total_reserves_usd;
        let new_total = old_total + amount_usd;
        for w in &mut self.weights {
            *w *= old_total / new_total;
        }
        self.weights[AssetClass::Sdr as usize] += amount_usd / new_total;
        self.total_reserves_usd = new_total;
        normalize(&mut self.weights);
    }

    /// Snapshot of current weights (testing and reporting).
    pub fn reserve_weights(&self) -> ReserveWeights {
        self.weights
    }
}

fn normalize(weights: &mut [f64; ASSETS]) {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use types::{FxRates, Regime};

    fn market(tick: u64, risk: f64) -> MarketState {
        MarketState {
            tick,
            rates: FxRates::from_fn(|c| if c == Currency::Eur { 1.12 } else { 1.0 }),
            regime: Regime::Calm,
            risk_index: risk,
            event_occurred: false,
            gold_price: 2000.0,
            silver_price: 25.0,
            sdr_value: 1.35,
        }
    }

    fn agent(policy: &ReservePolicy) -> CentralBankAgent {
        CentralBankAgent::new(1, "test bank", Currency::Eur, 1000.0, 0.9, 0.2, policy, 1.12)
    }

    fn assert_weights_normalized(agent: &CentralBankAgent) {
        let sum: f64 = agent.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights sum to {sum}");
        assert!(agent.weights.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_revalue_tracks_price_moves() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        let prev = market(0, 0.3);
        let mut now = market(1, 0.3);
        now.gold_price = 2200.0; // +10% gold

        let gold_before = bank.holding_usd(AssetClass::Gold);
        bank.revalue(&prev, &now, &policy, 1.0 / 365.25);

        assert_weights_normalized(&bank);
        assert!(bank.total_reserves_usd > 1000.0);
        let gold_after = bank.holding_usd(AssetClass::Gold);
        assert!((gold_after / gold_before - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_revalue_flat_market_accrues_securities_yield() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        let prev = market(0, 0.3);
        let now = market(1, 0.3);
        bank.revalue(&prev, &now, &policy, 1.0 / 365.25);
        assert_weights_normalized(&bank);
        // Only the securities bucket grew.
        let expected = 1000.0 * (1.0 + 0.05 * 0.03 / 365.25);
        assert!((bank.total_reserves_usd - expected).abs() < 1e-9);
    }

    #[test]
    fn test_depletion_deactivates() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        bank.total_reserves_usd = 0.0;
        let prev = market(0, 0.3);
        let now = market(1, 0.3);
        bank.revalue(&prev, &now, &policy, 1.0 / 365.25);
        assert!(!bank.active);
        assert_eq!(bank.total_reserves_usd, 0.0);

        // A depleted bank makes no decisions.
        let mut rng = StdRng::seed_from_u64(1);
        let decision = bank.decide(&now, &policy, &mut rng);
        assert_eq!(decision, Decision::default());
    }

    #[test]
    fn test_rebalance_triggers_on_threshold() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        // Push USD 10 points over target, take it from EUR.
        bank.weights[AssetClass::Usd as usize] += 0.10;
        bank.weights[AssetClass::Eur as usize] -= 0.10;

        let mut rng = StdRng::seed_from_u64(1);
        let decision = bank.decide(&market(1, 0.3), &policy, &mut rng);
        assert!(decision.rebalanced);
        assert_weights_normalized(&bank);

        // Deviation shrank by the participation rate.
        let dev = bank.weights[AssetClass::Usd as usize]
            - bank.targets[AssetClass::Usd as usize];
        assert!((dev - 0.10 * (1.0 - 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_no_rebalance_inside_threshold() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        bank.weights[AssetClass::Usd as usize] += 0.01;
        bank.weights[AssetClass::Eur as usize] -= 0.01;

        let mut rng = StdRng::seed_from_u64(1);
        let decision = bank.decide(&market(1, 0.3), &policy, &mut rng);
        assert!(!decision.rebalanced);
    }

    #[test]
    fn test_high_risk_forces_rebalance() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        bank.risk_tolerance = 0.5;
        let mut rng = StdRng::seed_from_u64(1);
        let decision = bank.decide(&market(1, 0.6), &policy, &mut rng);
        assert!(decision.rebalanced);
    }

    #[test]
    fn test_stress_liquidation_ladder() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        let mut rng = StdRng::seed_from_u64(1);

        let securities_before = bank.weights[AssetClass::Securities as usize];
        let gold_before = bank.weights[AssetClass::Gold as usize];
        let decision = bank.decide(&market(1, 0.9), &policy, &mut rng);
        assert!(decision.liquidated);
        // Securities shrink first; gold is untouched while securities remain.
        assert!(bank.weights[AssetClass::Securities as usize] < securities_before);
        assert!(bank.weights[AssetClass::Gold as usize] >= gold_before - 1e-12);
        assert_weights_normalized(&bank);

        // Drain securities entirely; the ladder falls through to gold.
        bank.weights[AssetClass::Usd as usize] +=
            bank.weights[AssetClass::Securities as usize];
        bank.weights[AssetClass::Securities as usize] = 0.0;
        bank.targets = bank.weights; // suppress the rebalance leg
        let gold_before = bank.weights[AssetClass::Gold as usize];
        bank.decide(&market(2, 0.9), &policy, &mut rng);
        assert!(bank.weights[AssetClass::Gold as usize] < gold_before);
    }

    #[test]
    fn test_intervention_opposes_move() {
        let policy = ReservePolicy {
            intervention_probability: 1.0,
            ..ReservePolicy::default()
        };
        let mut bank = agent(&policy);
        let mut rng = StdRng::seed_from_u64(1);

        // EUR fell 10% against USD since the last intervention.
        let mut state = market(1, 0.3);
        state.rates.set(Currency::Eur, 1.12 * 0.9);
        let decision = bank.decide(&state, &policy, &mut rng);
        let intervention = decision.intervention.expect("band breached at p=1");
        assert_eq!(intervention.currency, Currency::Eur);
        assert_eq!(intervention.direction, 1.0); // support the falling rate
    }

    #[test]
    fn test_no_intervention_inside_band() {
        let policy = ReservePolicy {
            intervention_probability: 1.0,
            ..ReservePolicy::default()
        };
        let mut bank = agent(&policy);
        let mut rng = StdRng::seed_from_u64(1);
        let decision = bank.decide(&market(1, 0.3), &policy, &mut rng);
        assert!(decision.intervention.is_none());
    }

    #[test]
    fn test_mandate_drift_shifts_from_usd() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        let usd_before = bank.targets[AssetClass::Usd as usize];
        let gold_before = bank.targets[AssetClass::Gold as usize];

        for _ in 0..365 {
            bank.drift_mandate(&policy, 1.0 / 365.25, 1.0);
        }
        assert!(bank.targets[AssetClass::Usd as usize] < usd_before);
        assert!(bank.targets[AssetClass::Gold as usize] > gold_before);
        let sum: f64 = bank.targets.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sdr_allocation_credited() {
        let policy = ReservePolicy::default();
        let mut bank = agent(&policy);
        let sdr_before = bank.holding_usd(AssetClass::Sdr);
        bank.receive_sdr_allocation(100.0);
        assert!((bank.total_reserves_usd - 1100.0).abs() < 1e-9);
        assert!((bank.holding_usd(AssetClass::Sdr) - (sdr_before + 100.0)).abs() < 1e-9);
        assert_weights_normalized(&bank);
    }
}
