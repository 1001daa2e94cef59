//! Run-level summary statistics, the CLI's printable digest of a result.

use std::fmt;

use serde::{Deserialize, Serialize};

use types::{Currency, SimulationResult};

use crate::stats;

/// Per-currency closing figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub currency: Currency,
    pub final_rate: f64,
    pub total_return: f64,
    pub annualized_vol: f64,
}

/// Digest of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub seed: u64,
    pub currencies: Vec<CurrencySummary>,
    pub final_gold_price: f64,
    pub gold_return: f64,
    pub final_silver_price: f64,
    pub final_gold_silver_ratio: f64,
    pub final_sdr_value: f64,
    /// Trade-weighted USD index, 100.0 at the run's first recorded rates.
    pub final_usd_index: f64,
    pub mean_risk_index: f64,
    pub max_risk_index: f64,
    pub crisis_fraction: f64,
    pub jump_events: usize,
    pub final_total_reserves_usd: f64,
    pub final_usd_share: f64,
    pub final_gold_share: f64,
    pub total_interventions: u64,
    pub total_rebalances: u64,
}

impl RunSummary {
    /// Build a summary from a result. `dt` is the step length in years,
    /// used to annualize volatilities. Returns `None` for an empty run.
    pub fn from_result(result: &SimulationResult, dt: f64) -> Option<Self> {
        let first = result.snapshots.first()?;
        let last = result.last()?;
        let dt_vol = |series: &[f64]| {
            stats::std_dev(&stats::log_returns(series)).unwrap_or(0.0)
        };

        let currencies = Currency::NON_BASE
            .iter()
            .map(|&c| {
                let series = result.series(|s| s.market.rates.get(c));
                CurrencySummary {
                    currency: c,
                    final_rate: last.market.rates.get(c),
                    total_return: last.market.rates.get(c)
                        / first.market.rates.get(c)
                        - 1.0,
                    annualized_vol: stats::annualized_vol(dt_vol(&series), dt),
                }
            })
            .collect();

        let risk_series = result.series(|s| s.market.risk_index);
        let gold_series = result.series(|s| s.market.gold_price);
        let crisis_steps = result
            .snapshots
            .iter()
            .filter(|s| s.market.regime.is_crisis())
            .count();
        let jump_events = result
            .snapshots
            .iter()
            .filter(|s| s.market.event_occurred)
            .count();

        Some(Self {
            steps: result.len(),
            seed: result.seed,
            currencies,
            final_gold_price: last.market.gold_price,
            gold_return: last.market.gold_price / gold_series[0] - 1.0,
            final_silver_price: last.market.silver_price,
            final_gold_silver_ratio: last.market.gold_silver_ratio(),
            final_sdr_value: last.market.sdr_value,
            final_usd_index: last.market.rates.usd_index(&first.market.rates),
            mean_risk_index: stats::mean(&risk_series).unwrap_or(0.0),
            max_risk_index: risk_series.iter().copied().fold(0.0, f64::max),
            crisis_fraction: crisis_steps as f64 / result.len() as f64,
            jump_events,
            final_total_reserves_usd: last.total_reserves_usd,
            final_usd_share: last.usd_share,
            final_gold_share: last.gold_share,
            total_interventions: result
                .snapshots
                .iter()
                .map(|s| u64::from(s.interventions))
                .sum(),
            total_rebalances: result
                .snapshots
                .iter()
                .map(|s| u64::from(s.rebalances))
                .sum(),
        })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary ({} steps, seed {})", self.steps, self.seed)?;
        writeln!(f, "  Market")?;
        for c in &self.currencies {
            writeln!(
                f,
                "    {:<3} rate {:>10.4}  return {:>+7.2}%  vol {:>5.1}%",
                c.currency.code(),
                c.final_rate,
                c.total_return * 100.0,
                c.annualized_vol * 100.0
            )?;
        }
        writeln!(
            f,
            "    gold {:.2} USD/oz ({:+.2}%), silver {:.2} USD/oz (ratio {:.1}), SDR {:.4} USD",
            self.final_gold_price,
            self.gold_return * 100.0,
            self.final_silver_price,
            self.final_gold_silver_ratio,
            self.final_sdr_value
        )?;
        writeln!(f, "    USD index {:.1} (100.0 at run start)", self.final_usd_index)?;
        writeln!(
            f,
            "  Risk: mean {:.3}, max {:.3}, crisis {:.1}% of steps, {} jump events",
            self.mean_risk_index,
            self.max_risk_index,
            self.crisis_fraction * 100.0,
            self.jump_events
        )?;
        writeln!(
            f,
            "  Reserves: {:.1} bn USD, USD share {:.1}%, gold share {:.1}%",
            self.final_total_reserves_usd / 1e9,
            self.final_usd_share * 100.0,
            self.final_gold_share * 100.0
        )?;
        write!(
            f,
            "  Activity: {} interventions, {} rebalances",
            self.total_interventions, self.total_rebalances
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scenario;
    use crate::runner::run;

    #[test]
    fn test_summary_from_short_run() {
        let config = Scenario::Baseline.config();
        let dt = config.dt();
        let result = run(config, 100, 5).unwrap();
        let summary = RunSummary::from_result(&result, dt).unwrap();
        assert_eq!(summary.steps, 100);
        assert_eq!(summary.seed, 5);
        assert_eq!(summary.currencies.len(), Currency::NON_BASE.len());
        assert!(summary.final_gold_price > 0.0);
        assert!(summary.final_gold_silver_ratio > 0.0);
        assert!(
            (summary.final_gold_silver_ratio
                - result.last().unwrap().market.gold_silver_ratio())
            .abs()
                < 1e-12
        );
        assert!(summary.final_usd_index > 0.0);
        assert!((0.0..=1.0).contains(&summary.crisis_fraction));
    }

    #[test]
    fn test_summary_empty_run_is_none() {
        let result = SimulationResult::new(1);
        assert!(RunSummary::from_result(&result, 1.0 / 365.25).is_none());
    }

    #[test]
    fn test_summary_display_renders() {
        let config = Scenario::Crisis.config();
        let dt = config.dt();
        let result = run(config, 50, 9).unwrap();
        let summary = RunSummary::from_result(&result, dt).unwrap();
        let text = summary.to_string();
        assert!(text.contains("Run summary"));
        assert!(text.contains("EUR"));
        assert!(text.contains("gold"));
        assert!(text.contains("USD index"));
    }
}
