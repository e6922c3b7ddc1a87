//! Trial harness for comparing strategies.
//!
//! Runs a strategy many times on fresh populations and aggregates:
//! - steps and problems attempted, collected for successful runs only
//! - budget-exceeded runs, counted separately as fails
//! - logical failures (targets exhausted without the top-10 set)
//! - means as `f64` averages and p50/p95 step percentiles
//!
//! Trial `i` draws from its own `StdRng` seeded with `seed + i`, so runs
//! share nothing and the report is identical whether trials run
//! sequentially or on the rayon pool.

use crate::error::SimulationResult;
use crate::strategy::{OutcomeCode, Strategy, StrategyOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters shared by every trial of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub agents: usize,
    pub problems: usize,
    pub trials: usize,
    /// Base seed; trial `i` uses `seed + i`
    pub seed: u64,
    /// Run trials on the rayon thread pool
    pub parallel: bool,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            agents: 100,
            problems: 100,
            trials: 2000,
            seed: 0,
            parallel: false,
        }
    }
}

/// One finished trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    pub seed: u64,
    pub outcome: StrategyOutcome,
}

/// Aggregated results of a batch of trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    pub strategy: Strategy,
    pub trials: usize,
    /// Steps of each successful run
    pub steps: Vec<u64>,
    /// Problems attempted in each successful run
    pub problems_solved: Vec<u64>,
    pub successes: usize,
    /// Runs that processed every target without completing the top-10 set
    pub failures: usize,
    /// Runs aborted by the step budget
    pub fails: usize,
    pub steps_mean: f64,
    pub problems_solved_mean: f64,
    pub steps_p50: u64,
    pub steps_p95: u64,
}

impl TrialReport {
    /// Fraction of trials that solved the top-10 set (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.successes as f64 / self.trials as f64
    }
}

fn trial_seed(base: u64, trial: usize) -> u64 {
    base.wrapping_add(trial as u64)
}

fn run_one(strategy: Strategy, config: &TrialConfig, trial: usize) -> SimulationResult<TrialRecord> {
    let seed = trial_seed(config.seed, trial);
    let mut rng = StdRng::seed_from_u64(seed);
    let outcome = strategy.run(config.agents, config.problems, &mut rng)?;
    debug!(
        %strategy,
        trial,
        code = %outcome.code,
        steps = outcome.steps,
        "Trial finished"
    );
    Ok(TrialRecord {
        trial,
        seed,
        outcome,
    })
}

/// Run `config.trials` independent trials of `strategy`.
pub fn run_trials(strategy: Strategy, config: &TrialConfig) -> SimulationResult<TrialReport> {
    let records: Vec<TrialRecord> = if config.parallel {
        (0..config.trials)
            .into_par_iter()
            .map(|trial| run_one(strategy, config, trial))
            .collect::<SimulationResult<Vec<_>>>()?
    } else {
        (0..config.trials)
            .map(|trial| run_one(strategy, config, trial))
            .collect::<SimulationResult<Vec<_>>>()?
    };

    let report = compute_report(strategy, &records);
    info!(
        %strategy,
        trials = report.trials,
        successes = report.successes,
        failures = report.failures,
        fails = report.fails,
        steps_mean = report.steps_mean,
        "Trials complete"
    );
    Ok(report)
}

/// Run every strategy in `strategies` on the same configuration.
pub fn compare_strategies(
    strategies: &[Strategy],
    config: &TrialConfig,
) -> SimulationResult<Vec<TrialReport>> {
    strategies
        .iter()
        .map(|&strategy| run_trials(strategy, config))
        .collect()
}

/// Aggregate trial records into a report.
pub fn compute_report(strategy: Strategy, records: &[TrialRecord]) -> TrialReport {
    let successful: Vec<&StrategyOutcome> = records
        .iter()
        .map(|r| &r.outcome)
        .filter(|o| o.code == OutcomeCode::Success)
        .collect();

    let steps: Vec<u64> = successful.iter().map(|o| o.steps).collect();
    let problems_solved: Vec<u64> = successful.iter().map(|o| o.problems_attempted).collect();

    let failures = records
        .iter()
        .filter(|r| r.outcome.code == OutcomeCode::Failure)
        .count();
    let fails = records
        .iter()
        .filter(|r| r.outcome.code == OutcomeCode::BudgetExceeded)
        .count();

    let mut sorted_steps = steps.clone();
    sorted_steps.sort_unstable();

    TrialReport {
        strategy,
        trials: records.len(),
        steps_mean: mean(&steps),
        problems_solved_mean: mean(&problems_solved),
        steps_p50: percentile_u64(&sorted_steps, 50),
        steps_p95: percentile_u64(&sorted_steps, 95),
        successes: successful.len(),
        failures,
        fails,
        steps,
        problems_solved,
    }
}

/// Render reports as a Markdown comparison table.
pub fn format_comparison(reports: &[TrialReport]) -> String {
    let mut out = String::new();

    out.push_str("# Strategy Comparison\n\n");
    out.push_str(
        "| Strategy | Trials | Success | Failure | Budget exceeded | Mean steps | p50 steps | p95 steps | Mean problems |\n",
    );
    out.push_str(
        "|----------|--------|---------|---------|-----------------|------------|-----------|-----------|---------------|\n",
    );
    for report in reports {
        out.push_str(&format!(
            "| {} | {} | {} ({:.1}%) | {} | {} | {:.2} | {} | {} | {:.2} |\n",
            report.strategy.label(),
            report.trials,
            report.successes,
            report.success_rate() * 100.0,
            report.failures,
            report.fails,
            report.steps_mean,
            report.steps_p50,
            report.steps_p95,
            report.problems_solved_mean,
        ));
    }

    out
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Compute the p-th percentile from a sorted slice of u64.
fn percentile_u64(sorted: &[u64], p: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (p * sorted.len() / 100).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trial: usize, code: OutcomeCode, steps: u64, problems: u64) -> TrialRecord {
        TrialRecord {
            trial,
            seed: trial as u64,
            outcome: StrategyOutcome {
                code,
                steps,
                problems_attempted: problems,
            },
        }
    }

    #[test]
    fn test_compute_report_empty() {
        let report = compute_report(Strategy::Direct, &[]);
        assert_eq!(report.trials, 0);
        assert_eq!(report.steps_mean, 0.0);
        assert_eq!(report.success_rate(), 0.0);
    }

    #[test]
    fn test_compute_report_counts_only_successes() {
        let records = vec![
            record(0, OutcomeCode::Success, 40, 10),
            record(1, OutcomeCode::Success, 61, 13),
            record(2, OutcomeCode::BudgetExceeded, 1001, 2),
            record(3, OutcomeCode::Failure, 300, 12),
        ];
        let report = compute_report(Strategy::TwoLayered, &records);

        assert_eq!(report.trials, 4);
        assert_eq!(report.successes, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.fails, 1);
        assert_eq!(report.steps, vec![40, 61]);
        assert_eq!(report.problems_solved, vec![10, 13]);
        // Float means, no integer truncation.
        assert_eq!(report.steps_mean, 50.5);
        assert_eq!(report.problems_solved_mean, 11.5);
        assert_eq!(report.success_rate(), 0.5);
    }

    #[test]
    fn test_percentiles() {
        let records: Vec<TrialRecord> = [10, 50, 20, 40, 30]
            .into_iter()
            .enumerate()
            .map(|(i, steps)| record(i, OutcomeCode::Success, steps, 10))
            .collect();
        let report = compute_report(Strategy::ExpertsOnly, &records);
        assert_eq!(report.steps_p50, 30);
        assert_eq!(report.steps_p95, 50);
        // Collected in trial order, not sorted.
        assert_eq!(report.steps, vec![10, 50, 20, 40, 30]);
    }

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(percentile_u64(&[], 50), 0);
        assert_eq!(percentile_u64(&[42], 95), 42);
        assert_eq!(percentile_u64(&[1, 2, 3, 4, 5], 0), 1);
        assert_eq!(percentile_u64(&[1, 2, 3, 4, 5], 100), 5);
    }

    #[test]
    fn test_trial_seeds_are_offsets() {
        assert_eq!(trial_seed(7, 0), 7);
        assert_eq!(trial_seed(7, 3), 10);
        assert_eq!(trial_seed(u64::MAX, 1), 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = TrialConfig {
            agents: 10,
            problems: 15,
            trials: 12,
            seed: 5,
            parallel: false,
        };
        let parallel = TrialConfig {
            parallel: true,
            ..sequential.clone()
        };
        let a = run_trials(Strategy::ExpertsOnly, &sequential).unwrap();
        let b = run_trials(Strategy::ExpertsOnly, &parallel).unwrap();
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.problems_solved, b.problems_solved);
        assert_eq!(a.fails, b.fails);
        assert_eq!(a.trials, 12);
    }

    #[test]
    fn test_format_comparison() {
        let reports = vec![
            compute_report(
                Strategy::TwoLayered,
                &[record(0, OutcomeCode::Success, 80, 11)],
            ),
            compute_report(
                Strategy::Direct,
                &[record(0, OutcomeCode::BudgetExceeded, 1001, 0)],
            ),
        ];
        let table = format_comparison(&reports);
        assert!(table.contains("Strategy Comparison"));
        assert!(table.contains("| Two-layered | 1 | 1 (100.0%) | 0 | 0 | 80.00 |"));
        assert!(table.contains("| Direct | 1 | 0 (0.0%) | 0 | 1 |"));
    }

    #[test]
    fn test_report_serialization() {
        let report = compute_report(
            Strategy::ExpertsOnly,
            &[record(0, OutcomeCode::Success, 64, 30)],
        );
        let json = serde_json::to_string(&report).unwrap();
        let parsed: TrialReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.strategy, Strategy::ExpertsOnly);
        assert_eq!(parsed.steps, vec![64]);
    }
}
