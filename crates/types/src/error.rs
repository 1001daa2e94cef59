//! Error taxonomy for the simulation.

use thiserror::Error;

/// Errors that abort a simulation run.
///
/// Policy clamps (the [0, 1] risk-index clamp, the agent-depletion clamp)
/// are not errors; agent depletion is a logged warning and the run
/// continues with the agent inactive.
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// A configuration value failed pre-run validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A simulated quantity left its valid domain (NaN, infinity, or a
    /// non-positive price/rate). Carries the step at which it happened.
    #[error("numerical failure at step {step}: {quantity} = {value}")]
    Numerical {
        step: u64,
        quantity: String,
        value: f64,
    },
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::Config("weights sum to 0.9".into());
        assert_eq!(err.to_string(), "invalid configuration: weights sum to 0.9");

        let err = SimError::Numerical {
            step: 42,
            quantity: "EUR rate".into(),
            value: f64::NAN,
        };
        assert!(err.to_string().contains("step 42"));
        assert!(err.to_string().contains("EUR rate"));
    }
}
