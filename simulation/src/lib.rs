//! Governance Strategy Simulation Engine
//!
//! Models how a population of agents with partially hidden preferences and
//! expertise identifies and resolves its ten most preferred problems under
//! a step budget, and compares three strategies by cost:
//!
//! - **Two-layered**: discover the top problems, then let experts solve them
//! - **Experts-only**: let experts solve every problem, ignoring preferences
//! - **Direct**: discover the top problems, then let everyone vote
//!
//! # Architecture
//!
//! ```text
//! Population::generate ──→ KnowledgeStore
//!          │                     │
//!          │          discover_top_preferences   (Two-layered, Direct)
//!          │                     │
//!          └────────→ resolve ←──┘                (all strategies)
//!                        │
//!                 StrategyOutcome ──→ trial::run_trials
//! ```
//!
//! Every run owns its population, knowledge store and step budget. The
//! random source is injected, so a fixed seed replays a run exactly.
//!
//! # Usage
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use simulation::{OutcomeCode, Strategy};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let outcome = Strategy::ExpertsOnly.run(5, 10, &mut rng).unwrap();
//! assert_ne!(outcome.code, OutcomeCode::Failure);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod budget;
pub mod discovery;
pub mod error;
pub mod knowledge;
pub mod population;
pub mod resolution;
pub mod strategy;
pub mod trial;

pub use budget::{StepBudget, STEPS_PER_PROBLEM};
pub use discovery::{
    discover_top_preferences, DiscoveryReport, DiscoveryStatus, EpisodeRecord, EpisodeSchedule,
    HypothesizedTopProblems, TopProblemLog,
};
pub use error::{Phase, SimulationError, SimulationResult};
pub use knowledge::KnowledgeStore;
pub use population::{Agent, AgentId, Population, Problem, ProblemId, TOP_PROBLEM_COUNT};
pub use resolution::{
    attempt_solve, resolve, select_cohort, Cohort, ProblemRecord, ResolutionReport,
    ResolutionStatus, VoteTally, EXPERT_CUTOFF,
};
pub use strategy::{
    run_direct, run_experts_only, run_two_layered, OutcomeCode, Strategy, StrategyOutcome,
};
pub use trial::{
    compare_strategies, compute_report, format_comparison, run_trials, TrialConfig, TrialRecord,
    TrialReport,
};
