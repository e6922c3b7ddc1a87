//! Per-agent record of which preferences have been revealed so far.

use crate::population::{Agent, AgentId, Population, ProblemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Revealed preferences, one map per agent.
///
/// Entries are only ever added; an agent's map grows by at most one entry
/// per ask and never shrinks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeStore {
    known: Vec<BTreeMap<ProblemId, f64>>,
}

impl KnowledgeStore {
    /// Empty store for every agent of `population`.
    pub fn new(population: &Population) -> Self {
        Self::with_agents(population.number_of_agents())
    }

    pub fn with_agents(number_of_agents: usize) -> Self {
        Self {
            known: vec![BTreeMap::new(); number_of_agents],
        }
    }

    /// Ask `agent` for its highest not-yet-revealed preference.
    ///
    /// Ties go to the lowest problem id. Returns the revealed entry, or
    /// `None` when the agent has nothing left to reveal.
    pub fn ask(&mut self, agent: &Agent) -> Option<(ProblemId, f64)> {
        let known = &mut self.known[agent.id.index()];
        let mut best: Option<(ProblemId, f64)> = None;
        for (problem, value) in agent.preferences() {
            if known.contains_key(&problem) {
                continue;
            }
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((problem, value));
            }
        }
        if let Some((problem, value)) = best {
            known.insert(problem, value);
        }
        best
    }

    /// Revealed preferences of `agent`
    pub fn known(&self, agent: AgentId) -> &BTreeMap<ProblemId, f64> {
        &self.known[agent.index()]
    }

    /// Number of revealed entries for `agent`
    pub fn revealed_count(&self, agent: AgentId) -> usize {
        self.known[agent.index()].len()
    }

    /// Total revealed entries across all agents
    pub fn total_revealed(&self) -> usize {
        self.known.iter().map(BTreeMap::len).sum()
    }

    /// Iterate `(agent, revealed map)` in agent order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &BTreeMap<ProblemId, f64>)> {
        self.known
            .iter()
            .enumerate()
            .map(|(i, known)| (AgentId(i as u32 + 1), known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(preference: Vec<f64>) -> Agent {
        let n = preference.len();
        Agent::new(AgentId(1), preference, vec![0.0; n])
    }

    #[test]
    fn test_ask_reveals_in_descending_order() {
        let agent = agent(vec![1.5, 4.0, 0.2, 3.1]);
        let mut store = KnowledgeStore::with_agents(1);

        assert_eq!(store.ask(&agent), Some((ProblemId(2), 4.0)));
        assert_eq!(store.ask(&agent), Some((ProblemId(4), 3.1)));
        assert_eq!(store.ask(&agent), Some((ProblemId(1), 1.5)));
        assert_eq!(store.ask(&agent), Some((ProblemId(3), 0.2)));
        assert_eq!(store.revealed_count(AgentId(1)), 4);
    }

    #[test]
    fn test_exhausted_agent_is_noop() {
        let agent = agent(vec![0.0, 2.0]);
        let mut store = KnowledgeStore::with_agents(1);
        store.ask(&agent);
        // Zero-valued preferences are still revealed.
        assert_eq!(store.ask(&agent), Some((ProblemId(1), 0.0)));
        assert_eq!(store.ask(&agent), None);
        assert_eq!(store.total_revealed(), 2);
    }

    #[test]
    fn test_ties_go_to_lowest_problem() {
        let agent = agent(vec![1.0, 2.0, 2.0, 2.0]);
        let mut store = KnowledgeStore::with_agents(1);
        assert_eq!(store.ask(&agent).map(|(p, _)| p), Some(ProblemId(2)));
        assert_eq!(store.ask(&agent).map(|(p, _)| p), Some(ProblemId(3)));
        assert_eq!(store.ask(&agent).map(|(p, _)| p), Some(ProblemId(4)));
    }
}
