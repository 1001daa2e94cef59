//! Central-bank reserve-management agents.
//!
//! Each agent holds a portfolio of reserve asset classes, revalues it at
//! the step's market prices, drifts its mandate targets, and decides on
//! rebalancing, stress liquidation, and FX intervention. Agents never
//! touch the market directly: decisions flow back to the orchestrator,
//! which feeds interventions to the FX engine on the next step.

mod bank;
mod policy;
mod roster;

pub use bank::{CentralBankAgent, Decision};
pub use policy::ReservePolicy;
pub use roster::{default_roster, validate_roster, BankSpec};
