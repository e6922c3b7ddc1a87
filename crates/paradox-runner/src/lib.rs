//! Trial runner for the governance strategy simulation
//!
//! Resolves configuration from defaults, the environment, an optional TOML
//! file and command-line flags, runs the selected strategies through
//! [`simulation::compare_strategies`], and renders the comparison.

pub mod config;
pub mod report;

pub use config::{FileConfig, Overrides, RunnerConfig, StrategySelection};
pub use report::{OutputFormat, RunSummary};

use anyhow::{Context, Result};
use tracing::info;

/// Run every selected strategy and collect the reports.
pub fn run(config: &RunnerConfig) -> Result<RunSummary> {
    let strategies = config.strategy.strategies();
    info!(
        agents = config.agents,
        problems = config.problems,
        trials = config.trials,
        seed = config.seed,
        strategy = %config.strategy,
        parallel = config.parallel,
        "Starting comparison"
    );
    let reports = simulation::compare_strategies(&strategies, &config.trial_config())
        .context("Simulation failed")?;
    Ok(RunSummary {
        config: config.clone(),
        reports,
    })
}
