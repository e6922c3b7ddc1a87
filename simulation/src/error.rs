//! Simulation error types
//!
//! Configuration errors abort a call before any step is spent. Budget
//! exhaustion is reported through the same enum so that protocols can
//! propagate it with `?`; the strategy layer turns it back into a tagged
//! outcome instead of failing the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Which protocol was running when a budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Preference discovery (elicitation asks)
    Discovery,
    /// Resolution (solve attempts)
    Resolution,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Errors raised by the simulation engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Expertise cutoff outside `[0, 1]`
    #[error("Expertise cutoff must be between 0 and 1, got {cutoff}")]
    InvalidCutoff { cutoff: f64 },

    /// Population parameters the generator cannot satisfy
    #[error("Invalid population: {message}")]
    InvalidPopulation { message: String },

    /// Step budget exceeded
    #[error("Exceeded maximum steps during {phase}: {steps} > {limit}")]
    BudgetExceeded { phase: Phase, steps: u64, limit: u64 },
}

impl SimulationError {
    /// Whether this error is the distinguished budget-exceeded outcome
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }

    /// Whether this error is a configuration problem reported before any work
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidCutoff { .. } | Self::InvalidPopulation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimulationError::InvalidCutoff { cutoff: 1.5 };
        assert_eq!(
            err.to_string(),
            "Expertise cutoff must be between 0 and 1, got 1.5"
        );

        let err = SimulationError::BudgetExceeded {
            phase: Phase::Resolution,
            steps: 1001,
            limit: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Exceeded maximum steps during resolution: 1001 > 1000"
        );
    }

    #[test]
    fn test_error_classification() {
        let budget = SimulationError::BudgetExceeded {
            phase: Phase::Discovery,
            steps: 11,
            limit: 10,
        };
        assert!(budget.is_budget_exceeded());
        assert!(!budget.is_configuration());

        let cutoff = SimulationError::InvalidCutoff { cutoff: -0.1 };
        assert!(cutoff.is_configuration());
        assert!(!cutoff.is_budget_exceeded());
    }
}
