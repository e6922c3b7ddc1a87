//! Strategy layer: fixed compositions of discovery and resolution.
//!
//! | Strategy     | Discovery | Targets            | Cutoff |
//! |--------------|-----------|--------------------|--------|
//! | Two-layered  | yes       | hypothesized list  | 0.5    |
//! | Experts-only | no        | every problem      | 0.5    |
//! | Direct       | yes       | hypothesized list  | 0.0    |
//!
//! Direct is the negative control: with a zero cutoff the whole
//! (mostly non-expert) population votes, so its majority is usually wrong.

use crate::discovery::discover_top_preferences;
use crate::error::{SimulationError, SimulationResult};
use crate::knowledge::KnowledgeStore;
use crate::population::{Population, ProblemId};
use crate::resolution::{resolve, ResolutionReport, ResolutionStatus, EXPERT_CUTOFF};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info_span};

/// Normalized outcome code of a strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    /// The canonical top-10 problems were all solved
    Success,
    /// Every target was processed but the top-10 set was not completed, or
    /// discovery stalled before finding it
    Failure,
    /// The step budget ran out
    BudgetExceeded,
}

impl OutcomeCode {
    /// Legacy numeric code: 100 success, 0 failure, -1 budget exceeded.
    pub fn as_code(&self) -> i32 {
        match self {
            Self::Success => 100,
            Self::Failure => 0,
            Self::BudgetExceeded => -1,
        }
    }
}

impl std::fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::BudgetExceeded => write!(f, "budget_exceeded"),
        }
    }
}

/// Normalized result of one strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub code: OutcomeCode,
    pub steps: u64,
    pub problems_attempted: u64,
}

impl StrategyOutcome {
    fn budget_exceeded(steps: u64, problems_attempted: u64) -> Self {
        Self {
            code: OutcomeCode::BudgetExceeded,
            steps,
            problems_attempted,
        }
    }

    fn discovery_failed(steps: u64) -> Self {
        Self {
            code: OutcomeCode::Failure,
            steps,
            problems_attempted: 0,
        }
    }

    fn from_resolution(report: &ResolutionReport) -> Self {
        let code = match report.status {
            ResolutionStatus::Won => OutcomeCode::Success,
            ResolutionStatus::Exhausted => OutcomeCode::Failure,
            ResolutionStatus::BudgetExceeded => OutcomeCode::BudgetExceeded,
        };
        Self {
            code,
            steps: report.steps,
            problems_attempted: report.problems_attempted,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == OutcomeCode::Success
    }
}

/// The three compared strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Discover the top problems, then let only experts solve them ("Paradox")
    TwoLayered,
    /// Let experts solve every problem, ignoring preferences ("Technocracy")
    ExpertsOnly,
    /// Discover the top problems, then let everyone vote ("Direct democracy")
    Direct,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::TwoLayered, Self::ExpertsOnly, Self::Direct];

    pub fn uses_discovery(&self) -> bool {
        !matches!(self, Self::ExpertsOnly)
    }

    pub fn expertise_cutoff(&self) -> f64 {
        match self {
            Self::TwoLayered | Self::ExpertsOnly => EXPERT_CUTOFF,
            Self::Direct => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwoLayered => "Two-layered",
            Self::ExpertsOnly => "Experts-only",
            Self::Direct => "Direct",
        }
    }

    /// Generate a population and run this strategy on it.
    pub fn run<R: Rng + ?Sized>(
        &self,
        number_of_agents: usize,
        number_of_problems: usize,
        rng: &mut R,
    ) -> SimulationResult<StrategyOutcome> {
        let mut population = Population::generate(number_of_agents, number_of_problems, rng)?;
        self.run_on(&mut population, rng)
    }

    /// Run this strategy on an existing population.
    ///
    /// Budget exhaustion in either protocol becomes
    /// [`OutcomeCode::BudgetExceeded`]; configuration errors are returned.
    pub fn run_on<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        rng: &mut R,
    ) -> SimulationResult<StrategyOutcome> {
        let span = info_span!("strategy", strategy = self.label());
        let _guard = span.enter();

        let (targets, starting_steps) = match self {
            Self::ExpertsOnly => (population.problem_ids().collect::<Vec<ProblemId>>(), 0),
            Self::TwoLayered | Self::Direct => {
                let truth = population.top_problems();
                let mut knowledge = KnowledgeStore::new(population);
                let discovery = match discover_top_preferences(population, &truth, &mut knowledge)
                {
                    Ok(report) => report,
                    Err(SimulationError::BudgetExceeded { steps, .. }) => {
                        return Ok(StrategyOutcome::budget_exceeded(steps, 0));
                    }
                    Err(err) => return Err(err),
                };
                debug!(
                    steps = discovery.steps,
                    hypothesized = discovery.hypothesized.len(),
                    containment = discovery.containment,
                    "Discovery finished"
                );
                if !discovery.is_complete() {
                    return Ok(StrategyOutcome::discovery_failed(discovery.steps));
                }
                // Direct starts resolution from zero: its reported steps
                // cover voting only.
                let starting_steps = match self {
                    Self::Direct => 0,
                    _ => discovery.steps,
                };
                (discovery.hypothesized, starting_steps)
            }
        };

        let report = resolve(
            population,
            &targets,
            starting_steps,
            self.expertise_cutoff(),
            rng,
        )?;
        Ok(StrategyOutcome::from_resolution(&report))
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoLayered => write!(f, "two-layered"),
            Self::ExpertsOnly => write!(f, "experts-only"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "two-layered" | "two_layered" | "paradox" => Ok(Self::TwoLayered),
            "experts-only" | "experts_only" | "technocracy" => Ok(Self::ExpertsOnly),
            "direct" | "direct-democracy" => Ok(Self::Direct),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Two-layered ("Paradox") entry point
pub fn run_two_layered<R: Rng + ?Sized>(
    number_of_agents: usize,
    number_of_problems: usize,
    rng: &mut R,
) -> SimulationResult<StrategyOutcome> {
    Strategy::TwoLayered.run(number_of_agents, number_of_problems, rng)
}

/// Experts-only ("Technocracy") entry point
pub fn run_experts_only<R: Rng + ?Sized>(
    number_of_agents: usize,
    number_of_problems: usize,
    rng: &mut R,
) -> SimulationResult<StrategyOutcome> {
    Strategy::ExpertsOnly.run(number_of_agents, number_of_problems, rng)
}

/// Direct democracy entry point
pub fn run_direct<R: Rng + ?Sized>(
    number_of_agents: usize,
    number_of_problems: usize,
    rng: &mut R,
) -> SimulationResult<StrategyOutcome> {
    Strategy::Direct.run(number_of_agents, number_of_problems, rng)
}
