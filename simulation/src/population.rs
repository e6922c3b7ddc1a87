//! Population generator: problems, agents, preferences and expertise.
//!
//! Problem weights are a permutation of `1..=P`, so every weight is distinct
//! and the ground-truth top set is unambiguous. Each problem's weight is
//! split among agents with normalized random fractions; expertise is drawn
//! as `u^4`, which makes experts a minority for any given problem.

use crate::error::{SimulationError, SimulationResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Size of the canonical top set the strategies try to resolve
pub const TOP_PROBLEM_COUNT: usize = 10;

/// Identifier of a problem, `1..=number_of_problems`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProblemId(pub u32);

impl ProblemId {
    /// Zero-based position of this problem in per-agent tables
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl std::fmt::Display for ProblemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "problem{}", self.0)
    }
}

/// Identifier of an agent, `1..=number_of_agents`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent{}", self.0)
    }
}

/// A unit of work with a fixed total preference weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    /// Sum of all agents' preference for this problem
    pub total_preference_weight: u32,
    /// Whether this is one of the ten heaviest problems
    pub top10: bool,
    /// Set by the resolution protocol once a vote succeeds
    pub solved: bool,
}

/// A participant with private preference and expertise values.
///
/// Both tables are indexed by [`ProblemId::index`] and cover every problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    preference: Vec<f64>,
    expertise: Vec<f64>,
}

impl Agent {
    /// Build an agent from explicit tables (test fixtures, replays).
    pub fn new(id: AgentId, preference: Vec<f64>, expertise: Vec<f64>) -> Self {
        Self {
            id,
            preference,
            expertise,
        }
    }

    /// This agent's share of `problem`'s total weight
    pub fn preference(&self, problem: ProblemId) -> f64 {
        self.preference[problem.index()]
    }

    /// Probability that this agent alone resolves `problem`
    pub fn expertise(&self, problem: ProblemId) -> f64 {
        self.expertise[problem.index()]
    }

    /// Preferences in problem-id order
    pub fn preferences(&self) -> impl Iterator<Item = (ProblemId, f64)> + '_ {
        self.preference
            .iter()
            .enumerate()
            .map(|(i, &value)| (ProblemId(i as u32 + 1), value))
    }
}

/// Generated problems and agents for one simulation run.
///
/// Each run owns its population; the only mutable part is the problems'
/// `solved` flags, written by the resolution protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    problems: Vec<Problem>,
    agents: Vec<Agent>,
}

impl Population {
    /// Generate `number_of_agents` agents over `number_of_problems` problems.
    pub fn generate<R: Rng + ?Sized>(
        number_of_agents: usize,
        number_of_problems: usize,
        rng: &mut R,
    ) -> SimulationResult<Self> {
        if number_of_agents == 0 {
            return Err(SimulationError::InvalidPopulation {
                message: "at least one agent is required".to_string(),
            });
        }
        if number_of_problems < TOP_PROBLEM_COUNT {
            return Err(SimulationError::InvalidPopulation {
                message: format!(
                    "at least {} problems are required, got {}",
                    TOP_PROBLEM_COUNT, number_of_problems
                ),
            });
        }

        let problems = generate_problems(number_of_problems, rng);
        let preference = assign_preferences(&problems, number_of_agents, rng);
        let agents = preference
            .into_iter()
            .enumerate()
            .map(|(i, preference)| {
                let expertise = (0..number_of_problems)
                    .map(|_| draw_expertise(rng))
                    .collect();
                Agent::new(AgentId(i as u32 + 1), preference, expertise)
            })
            .collect();

        Ok(Self { problems, agents })
    }

    /// Assemble a population from explicit parts.
    ///
    /// Problems must be numbered `1..=P` in order and every agent must carry
    /// `P` preference and expertise values.
    pub fn from_parts(problems: Vec<Problem>, agents: Vec<Agent>) -> SimulationResult<Self> {
        let count = problems.len();
        // Ids are 1-based; comparing raw ids keeps `index()` away from 0.
        if let Some(problem) = problems
            .iter()
            .enumerate()
            .find(|(i, p)| p.id.0 as usize != i + 1)
            .map(|(_, p)| p)
        {
            return Err(SimulationError::InvalidPopulation {
                message: format!("{} is out of order", problem.id),
            });
        }
        let flagged = problems.iter().filter(|p| p.top10).count();
        if flagged != TOP_PROBLEM_COUNT {
            return Err(SimulationError::InvalidPopulation {
                message: format!(
                    "exactly {} problems must be flagged top10, got {}",
                    TOP_PROBLEM_COUNT, flagged
                ),
            });
        }
        if agents.is_empty() {
            return Err(SimulationError::InvalidPopulation {
                message: "at least one agent is required".to_string(),
            });
        }
        for (i, agent) in agents.iter().enumerate() {
            if agent.id.0 as usize != i + 1 {
                return Err(SimulationError::InvalidPopulation {
                    message: format!("{} is out of order", agent.id),
                });
            }
            if agent.preference.len() != count || agent.expertise.len() != count {
                return Err(SimulationError::InvalidPopulation {
                    message: format!("{} does not cover all {} problems", agent.id, count),
                });
            }
        }
        Ok(Self { problems, agents })
    }

    pub fn number_of_problems(&self) -> usize {
        self.problems.len()
    }

    pub fn number_of_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }

    pub fn problem(&self, id: ProblemId) -> &Problem {
        &self.problems[id.index()]
    }

    /// All problem ids in ascending order
    pub fn problem_ids(&self) -> impl Iterator<Item = ProblemId> + '_ {
        self.problems.iter().map(|p| p.id)
    }

    /// The ground-truth top problems
    pub fn top_problems(&self) -> BTreeSet<ProblemId> {
        self.problems
            .iter()
            .filter(|p| p.top10)
            .map(|p| p.id)
            .collect()
    }

    /// Mark `problem` solved after a successful vote.
    pub fn mark_solved(&mut self, problem: ProblemId) {
        self.problems[problem.index()].solved = true;
    }

    /// Whether every ground-truth top problem is solved (the win condition).
    pub fn top_problems_solved(&self) -> bool {
        self.problems.iter().filter(|p| p.top10).all(|p| p.solved)
    }

    /// Number of problems currently marked solved
    pub fn solved_count(&self) -> usize {
        self.problems.iter().filter(|p| p.solved).count()
    }
}

fn generate_problems<R: Rng + ?Sized>(number_of_problems: usize, rng: &mut R) -> Vec<Problem> {
    let mut ordering: Vec<u32> = (1..=number_of_problems as u32).collect();
    ordering.shuffle(rng);

    let mut problems: Vec<Problem> = (1..=number_of_problems as u32)
        .map(|id| Problem {
            id: ProblemId(id),
            total_preference_weight: 0,
            top10: false,
            solved: false,
        })
        .collect();

    // Walking the random ordering hands out P, P-1, ..., 1.
    for (rank, &id) in ordering.iter().enumerate() {
        let problem = &mut problems[id as usize - 1];
        problem.total_preference_weight = (number_of_problems - rank) as u32;
        problem.top10 = rank < TOP_PROBLEM_COUNT;
    }

    problems
}

/// Returns per-agent preference tables, agent-major.
fn assign_preferences<R: Rng + ?Sized>(
    problems: &[Problem],
    number_of_agents: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut tables = vec![vec![0.0; problems.len()]; number_of_agents];

    for problem in problems {
        let fractions: Vec<f64> = (0..number_of_agents).map(|_| rng.gen::<f64>()).collect();
        let denominator: f64 = fractions.iter().sum();
        let weight = f64::from(problem.total_preference_weight);

        let mut shares: Vec<f64> = fractions
            .iter()
            .map(|fraction| {
                if denominator > 0.0 {
                    round_to(fraction / denominator * weight, 1)
                } else {
                    round_to(weight / number_of_agents as f64, 1)
                }
            })
            .collect();
        shares.shuffle(rng);

        for (table, share) in tables.iter_mut().zip(shares) {
            table[problem.id.index()] = share;
        }
    }

    tables
}

fn draw_expertise<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    round_to(rng.gen::<f64>().powi(4), 4)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
