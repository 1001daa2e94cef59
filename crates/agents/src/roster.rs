//! Roster of central banks participating in a run.

use serde::{Deserialize, Serialize};

use types::{Currency, SimError, SimResult};

/// Declarative description of one central bank, turned into a
/// [`crate::CentralBankAgent`] at simulation start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSpec {
    pub name: String,
    pub domestic_currency: Currency,
    pub initial_reserves_usd: f64,
    /// Share of IMF quota. Shares across the roster must sum to 1.
    pub quota_share: f64,
    /// Risk-index level that forces this bank to rebalance.
    pub risk_tolerance: f64,
}

impl BankSpec {
    pub fn new(
        name: impl Into<String>,
        domestic_currency: Currency,
        initial_reserves_usd: f64,
        quota_share: f64,
        risk_tolerance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            domestic_currency,
            initial_reserves_usd,
            quota_share,
            risk_tolerance,
        }
    }
}

/// Validate a roster: non-empty, positive reserves, quota shares summing
/// to 1, tolerances in [0, 1].
pub fn validate_roster(roster: &[BankSpec]) -> SimResult<()> {
    if roster.is_empty() {
        return Err(SimError::Config("roster has no central banks".into()));
    }
    for spec in roster {
        if !(spec.initial_reserves_usd.is_finite() && spec.initial_reserves_usd > 0.0) {
            return Err(SimError::Config(format!(
                "{}: initial reserves {} must be positive",
                spec.name, spec.initial_reserves_usd
            )));
        }
        if !(0.0..=1.0).contains(&spec.quota_share) {
            return Err(SimError::Config(format!(
                "{}: quota share {} is outside [0, 1]",
                spec.name, spec.quota_share
            )));
        }
        if !(0.0..=1.0).contains(&spec.risk_tolerance) {
            return Err(SimError::Config(format!(
                "{}: risk tolerance {} is outside [0, 1]",
                spec.name, spec.risk_tolerance
            )));
        }
    }
    let quota_sum: f64 = roster.iter().map(|s| s.quota_share).sum();
    if (quota_sum - 1.0).abs() > 1e-6 {
        return Err(SimError::Config(format!(
            "roster quota shares sum to {quota_sum}, expected 1.0"
        )));
    }
    Ok(())
}

/// The default eight-bank roster: the major reserve holders, with
/// reserves in USD and quota shares normalized to the roster.
pub fn default_roster() -> Vec<BankSpec> {
    vec![
        BankSpec::new("People's Bank of China", Currency::Cny, 3200e9, 0.28, 0.70),
        BankSpec::new("Bank of Japan", Currency::Jpy, 1300e9, 0.19, 0.75),
        BankSpec::new("Swiss National Bank", Currency::Chf, 900e9, 0.09, 0.80),
        BankSpec::new("European Central Bank", Currency::Eur, 280e9, 0.18, 0.75),
        BankSpec::new("Bank of England", Currency::Gbp, 150e9, 0.12, 0.80),
        BankSpec::new("Bank of Canada", Currency::Cad, 90e9, 0.07, 0.85),
        BankSpec::new("Reserve Bank of Australia", Currency::Aud, 60e9, 0.04, 0.85),
        BankSpec::new("Gulf Monetary Bloc", Currency::Usd, 700e9, 0.03, 0.65),
    ]
}
