//! Step budget shared by the discovery and resolution protocols.

use crate::error::{Phase, SimulationError, SimulationResult};
use serde::{Deserialize, Serialize};

/// Steps allowed per problem before a call is aborted
pub const STEPS_PER_PROBLEM: u64 = 100;

/// Monotone step counter bounded by `100 × number_of_problems`.
///
/// A step is one preference ask or one solve attempt. The counter only
/// grows; [`StepBudget::charge`] fails once the running total goes past the
/// limit, which is the sole cancellation mechanism of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBudget {
    steps: u64,
    limit: u64,
}

impl StepBudget {
    /// Budget for a population with `number_of_problems` problems.
    pub fn for_problems(number_of_problems: usize) -> Self {
        Self::with_limit(STEPS_PER_PROBLEM * number_of_problems as u64)
    }

    /// Budget with an explicit limit.
    pub fn with_limit(limit: u64) -> Self {
        Self { steps: 0, limit }
    }

    /// Continue counting from `steps` already spent.
    pub fn starting_at(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Spend one step; fails when the total now exceeds the limit.
    pub fn charge(&mut self, phase: Phase) -> SimulationResult<u64> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(SimulationError::BudgetExceeded {
                phase,
                steps: self.steps,
                limit: self.limit,
            });
        }
        Ok(self.steps)
    }

    /// Steps spent so far.
    pub fn spent(&self) -> u64 {
        self.steps
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Steps left before the next charge would fail.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_scales_with_problems() {
        assert_eq!(StepBudget::for_problems(10).limit(), 1000);
        assert_eq!(StepBudget::for_problems(100).limit(), 10_000);
    }

    #[test]
    fn test_charge_until_exceeded() {
        let mut budget = StepBudget::with_limit(3);
        assert_eq!(budget.charge(Phase::Resolution).unwrap(), 1);
        assert_eq!(budget.charge(Phase::Resolution).unwrap(), 2);
        assert_eq!(budget.charge(Phase::Resolution).unwrap(), 3);
        assert_eq!(budget.remaining(), 0);

        let err = budget.charge(Phase::Resolution).unwrap_err();
        assert_eq!(
            err,
            SimulationError::BudgetExceeded {
                phase: Phase::Resolution,
                steps: 4,
                limit: 3,
            }
        );
        assert_eq!(budget.spent(), 4);
    }

    #[test]
    fn test_starting_at_carries_prior_steps() {
        let mut budget = StepBudget::with_limit(10).starting_at(9);
        assert_eq!(budget.charge(Phase::Resolution).unwrap(), 10);
        assert!(budget.charge(Phase::Resolution).is_err());
    }

    #[test]
    fn test_starting_past_limit_fails_on_first_charge() {
        let mut budget = StepBudget::with_limit(5).starting_at(7);
        assert_eq!(budget.remaining(), 0);
        assert!(budget.charge(Phase::Discovery).is_err());
    }
}
