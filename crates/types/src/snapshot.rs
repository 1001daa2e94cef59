//! Per-step snapshots and the run-level result container.

use serde::{Deserialize, Serialize};

use crate::{AssetClass, MarketState, Tick};

/// Everything recorded about one completed step: the full market state
/// plus portfolio aggregates across all active agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub market: MarketState,
    /// Total reserves across all agents, USD.
    pub total_reserves_usd: f64,
    /// Aggregate USD value held per asset class, canonical order.
    pub holdings_usd: [f64; AssetClass::ALL.len()],
    /// Aggregate gold share of total reserves.
    pub gold_share: f64,
    /// Aggregate USD share of total reserves.
    pub usd_share: f64,
    /// Interventions flagged this step.
    pub interventions: u32,
    /// Agents that rebalanced this step.
    pub rebalances: u32,
}

impl StepSnapshot {
    pub fn tick(&self) -> Tick {
        self.market.tick
    }

    /// Aggregate share of total reserves held in `asset`.
    pub fn share(&self, asset: AssetClass) -> f64 {
        if self.total_reserves_usd > 0.0 {
            self.holdings_usd[asset as usize] / self.total_reserves_usd
        } else {
            0.0
        }
    }
}

/// Append-only history of a completed run. The sole hand-off artifact to
/// external consumers (CLI summary, CSV export, analysis tooling).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub snapshots: Vec<StepSnapshot>,
    /// Seed the run was executed with.
    pub seed: u64,
}

impl SimulationResult {
    pub fn new(seed: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, snapshot: StepSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn last(&self) -> Option<&StepSnapshot> {
        self.snapshots.last()
    }

    /// Extract one market series across the run.
    pub fn series(&self, f: impl Fn(&StepSnapshot) -> f64) -> Vec<f64> {
        self.snapshots.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, FxRates, Regime};

    fn snapshot(tick: Tick) -> StepSnapshot {
        let mut holdings_usd = [0.0; AssetClass::ALL.len()];
        holdings_usd[AssetClass::Usd as usize] = 600.0;
        holdings_usd[AssetClass::Gold as usize] = 50.0;
        holdings_usd[AssetClass::Securities as usize] = 350.0;
        StepSnapshot {
            market: MarketState {
                tick,
                rates: FxRates::from_fn(|_| 1.0),
                regime: Regime::Calm,
                risk_index: 0.3,
                event_occurred: false,
                gold_price: 2000.0,
                silver_price: 25.0,
                sdr_value: 1.35,
            },
            total_reserves_usd: 1000.0,
            holdings_usd,
            gold_share: 0.05,
            usd_share: 0.6,
            interventions: 0,
            rebalances: 1,
        }
    }

    #[test]
    fn test_share() {
        let snap = snapshot(3);
        assert!((snap.share(AssetClass::Usd) - 0.6).abs() < 1e-12);
        assert!((snap.share(AssetClass::Gold) - 0.05).abs() < 1e-12);
        assert_eq!(snap.share(AssetClass::Eur), 0.0);
        assert_eq!(snap.tick(), 3);
    }

    #[test]
    fn test_result_series() {
        let mut result = SimulationResult::new(7);
        assert!(result.is_empty());
        for t in 0..5 {
            result.push(snapshot(t));
        }
        assert_eq!(result.len(), 5);
        assert_eq!(result.last().unwrap().tick(), 4);
        let gold = result.series(|s| s.market.gold_price);
        assert_eq!(gold, vec![2000.0; 5]);
        assert_eq!(result.seed, 7);
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let snap = snapshot(1);
        let json = serde_json::to_string(&snap).unwrap();
        let back: StepSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.market.rates.get(Currency::Eur), 1.0);
    }
}
