//! paradox-runner: compare governance strategies over many trials
//!
//! # Usage
//!
//! ```bash
//! # All three strategies, 2000 trials each on 100 agents x 100 problems
//! paradox-runner
//!
//! # One strategy, smaller population, JSON output
//! paradox-runner --strategy experts-only --agents 20 --problems 40 --json
//!
//! # Settings from a file, trials on all cores
//! PARADOX_SEED=7 paradox-runner --config paradox.toml --parallel
//! ```

use anyhow::Result;
use clap::Parser;
use paradox_runner::{run, OutputFormat, Overrides, RunnerConfig, StrategySelection};
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of agents (overrides PARADOX_AGENTS)
    #[arg(long)]
    agents: Option<usize>,

    /// Number of problems, at least 10 (overrides PARADOX_PROBLEMS)
    #[arg(long)]
    problems: Option<usize>,

    /// Trials per strategy (overrides PARADOX_TRIALS)
    #[arg(long)]
    trials: Option<usize>,

    /// Base seed; trial i uses seed + i (overrides PARADOX_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// two-layered, experts-only, direct or all
    #[arg(long)]
    strategy: Option<StrategySelection>,

    /// Run trials on all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// TOML file with any of: agents, problems, trials, seed, strategy, parallel
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON instead of a Markdown table
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let overrides = Overrides {
        agents: args.agents,
        problems: args.problems,
        trials: args.trials,
        seed: args.seed,
        strategy: args.strategy,
        parallel: args.parallel,
    };
    let config = RunnerConfig::resolve(args.config.as_deref(), overrides)?;

    let summary = run(&config)?;
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Markdown
    };
    println!("{}", summary.render(format)?);
    Ok(())
}
