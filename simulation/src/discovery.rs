//! Preference discovery protocol
//!
//! Discovery runs in episodes. Each episode asks agents round-robin (from
//! agent 1) to reveal their highest unrevealed preference, rebuilds the
//! top-problem log from everything revealed so far, and extracts the
//! heaviest entries into the hypothesized top list.
//!
//! ```text
//! episode size: max(P, A) → ⌊size/2⌋+1 → … → 2
//!        ↓
//!   round-robin asks (1 step each, 100 × P per episode)
//!        ↓
//!   rebuild log from KnowledgeStore (fresh every episode)
//!        ↓
//!   extract 10 + ⌊0.1 × P⌋ heaviest entries, append the new ones
//!        ↓
//!   containment vs ground truth ── 100% → done
//!                               └─ nothing revealed or added → stalled
//! ```
//!
//! The ground-truth top set is only consulted by the containment check that
//! decides when to stop; ranking never sees it.

use crate::budget::StepBudget;
use crate::error::{Phase, SimulationResult};
use crate::knowledge::KnowledgeStore;
use crate::population::{Population, ProblemId, TOP_PROBLEM_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Episode sizes: `max(P, A)` first, then `⌊previous / 2⌋ + 1`.
#[derive(Debug, Clone)]
pub struct EpisodeSchedule {
    next: usize,
}

impl EpisodeSchedule {
    pub fn new(number_of_problems: usize, number_of_agents: usize) -> Self {
        Self {
            next: number_of_problems.max(number_of_agents),
        }
    }

    /// Size of the next episode.
    pub fn advance(&mut self) -> usize {
        let size = self.next;
        self.next = size / 2 + 1;
        size
    }
}

impl Iterator for EpisodeSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        Some(self.advance())
    }
}

/// Number of log entries extracted per episode: `10 + ⌊0.1 × P⌋`.
pub fn extraction_size(number_of_problems: usize) -> usize {
    TOP_PROBLEM_COUNT + number_of_problems / 10
}

/// Running sums of revealed preference values per problem.
#[derive(Debug, Clone, Default)]
pub struct TopProblemLog {
    totals: BTreeMap<ProblemId, f64>,
}

impl TopProblemLog {
    /// Sum every revealed value from scratch.
    pub fn rebuild(knowledge: &KnowledgeStore) -> Self {
        let mut totals = BTreeMap::new();
        for (_, known) in knowledge.iter() {
            for (&problem, &value) in known {
                *totals.entry(problem).or_insert(0.0) += value;
            }
        }
        Self { totals }
    }

    /// Remove and return the heaviest entry; ties go to the lowest id.
    pub fn pop_max(&mut self) -> Option<(ProblemId, f64)> {
        let mut best: Option<(ProblemId, f64)> = None;
        for (&problem, &total) in &self.totals {
            if best.map_or(true, |(_, top)| total > top) {
                best = Some((problem, total));
            }
        }
        if let Some((problem, _)) = best {
            self.totals.remove(&problem);
        }
        best
    }

    pub fn total(&self, problem: ProblemId) -> Option<f64> {
        self.totals.get(&problem).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Ordered, duplicate-free list of candidate top problems.
#[derive(Debug, Clone, Default)]
pub struct HypothesizedTopProblems {
    order: Vec<ProblemId>,
    members: BTreeSet<ProblemId>,
}

impl HypothesizedTopProblems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `problem` unless already present. Returns whether it was added.
    pub fn push(&mut self, problem: ProblemId) -> bool {
        if !self.members.insert(problem) {
            return false;
        }
        self.order.push(problem);
        true
    }

    pub fn contains(&self, problem: ProblemId) -> bool {
        self.members.contains(&problem)
    }

    pub fn as_slice(&self) -> &[ProblemId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<ProblemId> {
        self.order
    }
}

/// Percentage of `truth` present in `hypothesized`, rounded down.
pub fn containment(hypothesized: &HypothesizedTopProblems, truth: &BTreeSet<ProblemId>) -> u32 {
    if truth.is_empty() {
        return 100;
    }
    let found = truth.iter().filter(|p| hypothesized.contains(**p)).count();
    (found * 100 / truth.len()) as u32
}

/// What happened in one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-indexed episode number
    pub episode: u32,
    /// Asks made (steps spent) in this episode
    pub asks: usize,
    /// Asks that revealed something
    pub revealed: usize,
    /// Problems newly appended to the hypothesized list
    pub extracted: Vec<ProblemId>,
    /// Containment after this episode
    pub containment: u32,
}

/// How a discovery call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    /// Every ground-truth top problem is hypothesized
    Complete,
    /// An episode revealed nothing and added nothing, so no later episode
    /// can change the list
    Stalled,
}

/// Result of a discovery call that stayed within budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub status: DiscoveryStatus,
    /// Hypothesized top problems in extraction order
    pub hypothesized: Vec<ProblemId>,
    /// Total asks made across all episodes
    pub steps: u64,
    /// Final containment (100 when complete)
    pub containment: u32,
    /// Per-episode history
    pub episodes: Vec<EpisodeRecord>,
}

impl DiscoveryReport {
    pub fn is_complete(&self) -> bool {
        self.status == DiscoveryStatus::Complete
    }
}

/// Run discovery until the hypothesized list contains every problem of
/// `ground_truth`.
///
/// `knowledge` is carried across episodes and left populated for the
/// caller. Each episode has its own `100 × P` step budget; exceeding it
/// fails with `BudgetExceeded`. A stalled search returns
/// [`DiscoveryStatus::Stalled`] with containment below 100.
pub fn discover_top_preferences(
    population: &Population,
    ground_truth: &BTreeSet<ProblemId>,
    knowledge: &mut KnowledgeStore,
) -> SimulationResult<DiscoveryReport> {
    let agents = population.agents();
    let per_episode = extraction_size(population.number_of_problems());
    let mut hypothesized = HypothesizedTopProblems::new();
    let mut episodes = Vec::new();
    let mut total_steps = 0u64;

    let mut schedule = EpisodeSchedule::new(population.number_of_problems(), agents.len());
    let mut episode = 0u32;
    loop {
        episode += 1;
        let size = schedule.advance();
        let mut budget = StepBudget::for_problems(population.number_of_problems());
        let mut revealed = 0;
        for ask in 0..size {
            let agent = &agents[ask % agents.len()];
            if knowledge.ask(agent).is_some() {
                revealed += 1;
            }
            budget.charge(Phase::Discovery)?;
        }
        total_steps += budget.spent();

        // Earlier picks can come back; the hypothesized list drops them.
        let mut log = TopProblemLog::rebuild(knowledge);
        let mut extracted = Vec::new();
        for _ in 0..per_episode {
            let Some((problem, _)) = log.pop_max() else {
                break;
            };
            if hypothesized.push(problem) {
                extracted.push(problem);
            }
        }

        let contain = containment(&hypothesized, ground_truth);
        debug!(
            episode,
            size,
            revealed,
            extracted = extracted.len(),
            hypothesized = hypothesized.len(),
            containment = contain,
            steps = total_steps,
            "Discovery episode complete"
        );
        let stalled = revealed == 0 && extracted.is_empty();
        episodes.push(EpisodeRecord {
            episode,
            asks: size,
            revealed,
            extracted,
            containment: contain,
        });

        let status = if contain >= 100 {
            info!(
                episodes = episode,
                steps = total_steps,
                hypothesized = hypothesized.len(),
                "Discovery reached full containment"
            );
            DiscoveryStatus::Complete
        } else if stalled {
            warn!(
                episodes = episode,
                steps = total_steps,
                containment = contain,
                "Discovery stalled below full containment"
            );
            DiscoveryStatus::Stalled
        } else {
            continue;
        };

        return Ok(DiscoveryReport {
            status,
            hypothesized: hypothesized.into_vec(),
            steps: total_steps,
            containment: contain,
            episodes,
        });
    }
}
