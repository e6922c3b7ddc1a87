//! Expertise-weighted resolution protocol
//!
//! Each target problem gets a voting cohort (agents at or above the
//! expertise cutoff, or everyone when nobody qualifies). The cohort votes
//! repeatedly until a strict majority succeeds; every vote is one step on a
//! running total shared by all targets of the call.
//!
//! # Win check coupling
//!
//! After every successful vote the protocol checks whether the canonical
//! top-10 problems are all solved, whatever target list it is working
//! through. The top-10 solved flags live on the [`Population`], so a caller
//! resolving a larger list (every problem, for the experts-only strategy)
//! still stops as soon as the last top-10 problem falls.

use crate::budget::StepBudget;
use crate::error::{Phase, SimulationError, SimulationResult};
use crate::population::{AgentId, Population, ProblemId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Cutoff used by the expert-restricted strategies
pub const EXPERT_CUTOFF: f64 = 0.5;

/// Agents invited to vote on one problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub problem: ProblemId,
    pub members: Vec<AgentId>,
    /// True when nobody met the cutoff and the whole population votes
    pub fallback: bool,
}

impl Cohort {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Select every agent whose expertise for `problem` is at least `cutoff`.
pub fn select_cohort(population: &Population, problem: ProblemId, cutoff: f64) -> Cohort {
    let members: Vec<AgentId> = population
        .agents()
        .iter()
        .filter(|agent| agent.expertise(problem) >= cutoff)
        .map(|agent| agent.id)
        .collect();

    if members.is_empty() {
        return Cohort {
            problem,
            members: population.agents().iter().map(|agent| agent.id).collect(),
            fallback: true,
        };
    }

    Cohort {
        problem,
        members,
        fallback: false,
    }
}

/// Outcome of one vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl VoteTally {
    /// Strict majority; an exact tie fails.
    pub fn passed(&self) -> bool {
        self.succeeded > self.failed
    }
}

/// One vote: each member succeeds with probability equal to its expertise.
pub fn attempt_solve<R: Rng + ?Sized>(
    population: &Population,
    cohort: &Cohort,
    rng: &mut R,
) -> VoteTally {
    let mut tally = VoteTally {
        succeeded: 0,
        failed: 0,
    };
    for &member in &cohort.members {
        let expertise = population.agent(member).expertise(cohort.problem);
        if rng.gen::<f64>() < expertise {
            tally.succeeded += 1;
        } else {
            tally.failed += 1;
        }
    }
    tally
}

/// How a resolution call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Every canonical top-10 problem is solved
    Won,
    /// All targets solved without triggering the win check
    Exhausted,
    /// Step budget ran out mid-call
    BudgetExceeded,
}

/// Attempts spent on one target problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub problem: ProblemId,
    pub cohort_size: usize,
    pub fallback: bool,
    pub attempts: u64,
    pub solved: bool,
}

/// Result of a resolution call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub status: ResolutionStatus,
    /// Running step total, including `starting_steps`
    pub steps: u64,
    /// Targets carried through to a successful vote
    pub problems_attempted: u64,
    pub per_problem: Vec<ProblemRecord>,
}

/// Resolve `targets` in order, continuing the step count from
/// `starting_steps`.
///
/// Fails with `InvalidCutoff` before any vote when `expertise_cutoff` is
/// outside `[0, 1]`. Budget exhaustion is reported as
/// [`ResolutionStatus::BudgetExceeded`].
pub fn resolve<R: Rng + ?Sized>(
    population: &mut Population,
    targets: &[ProblemId],
    starting_steps: u64,
    expertise_cutoff: f64,
    rng: &mut R,
) -> SimulationResult<ResolutionReport> {
    if !(0.0..=1.0).contains(&expertise_cutoff) {
        return Err(SimulationError::InvalidCutoff {
            cutoff: expertise_cutoff,
        });
    }

    let mut budget =
        StepBudget::for_problems(population.number_of_problems()).starting_at(starting_steps);
    let mut problems_attempted = 0u64;
    let mut per_problem = Vec::with_capacity(targets.len());

    for &problem in targets {
        let cohort = select_cohort(population, problem, expertise_cutoff);
        let mut record = ProblemRecord {
            problem,
            cohort_size: cohort.len(),
            fallback: cohort.fallback,
            attempts: 0,
            solved: false,
        };

        while !record.solved {
            let tally = attempt_solve(population, &cohort, rng);
            record.attempts += 1;
            if tally.passed() {
                record.solved = true;
                population.mark_solved(problem);
            }

            if let Err(err) = budget.charge(Phase::Resolution) {
                warn!(%problem, steps = budget.spent(), "Resolution budget exceeded: {err}");
                per_problem.push(record);
                return Ok(ResolutionReport {
                    status: ResolutionStatus::BudgetExceeded,
                    steps: budget.spent(),
                    problems_attempted,
                    per_problem,
                });
            }

            if record.solved && population.top_problems_solved() {
                problems_attempted += 1;
                per_problem.push(record);
                info!(
                    steps = budget.spent(),
                    problems_attempted, "All top problems solved"
                );
                return Ok(ResolutionReport {
                    status: ResolutionStatus::Won,
                    steps: budget.spent(),
                    problems_attempted,
                    per_problem,
                });
            }
        }

        problems_attempted += 1;
        debug!(
            %problem,
            attempts = record.attempts,
            cohort = record.cohort_size,
            fallback = record.fallback,
            "Problem solved"
        );
        per_problem.push(record);
    }

    info!(
        steps = budget.spent(),
        problems_attempted, "Targets exhausted without solving every top problem"
    );
    Ok(ResolutionReport {
        status: ResolutionStatus::Exhausted,
        steps: budget.spent(),
        problems_attempted,
        per_problem,
    })
}
