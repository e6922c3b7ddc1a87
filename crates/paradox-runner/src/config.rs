//! Runner configuration
//!
//! Layers, lowest precedence first:
//! 1. [`RunnerConfig::default`] (100 agents, 100 problems, 2000 trials)
//! 2. `PARADOX_AGENTS`, `PARADOX_PROBLEMS`, `PARADOX_TRIALS`, `PARADOX_SEED`
//! 3. a TOML file passed with `--config`
//! 4. command-line flags

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use simulation::{Strategy, TrialConfig};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Which strategies a run compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategySelection {
    All,
    Single(Strategy),
}

impl StrategySelection {
    pub fn strategies(&self) -> Vec<Strategy> {
        match self {
            Self::All => Strategy::ALL.to_vec(),
            Self::Single(strategy) => vec![*strategy],
        }
    }
}

impl FromStr for StrategySelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Strategy>().map(Self::Single)
    }
}

impl std::fmt::Display for StrategySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Single(strategy) => write!(f, "{strategy}"),
        }
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerConfig {
    pub agents: usize,
    pub problems: usize,
    pub trials: usize,
    pub seed: u64,
    pub strategy: StrategySelection,
    pub parallel: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let trial = TrialConfig::default();
        Self {
            agents: trial.agents,
            problems: trial.problems,
            trials: trial.trials,
            seed: trial.seed,
            strategy: StrategySelection::All,
            parallel: trial.parallel,
        }
    }
}

/// Settings read from a TOML file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub agents: Option<usize>,
    pub problems: Option<usize>,
    pub trials: Option<usize>,
    pub seed: Option<u64>,
    pub strategy: Option<String>,
    pub parallel: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse TOML")
    }
}

/// Command-line values; `None` leaves the lower layers in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub agents: Option<usize>,
    pub problems: Option<usize>,
    pub trials: Option<usize>,
    pub seed: Option<u64>,
    pub strategy: Option<StrategySelection>,
    pub parallel: bool,
}

impl RunnerConfig {
    /// Defaults overlaid with `PARADOX_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay values from `lookup`; unparsable values are skipped.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = parse_var(&lookup, "PARADOX_AGENTS") {
            self.agents = n;
        }
        if let Some(n) = parse_var(&lookup, "PARADOX_PROBLEMS") {
            self.problems = n;
        }
        if let Some(n) = parse_var(&lookup, "PARADOX_TRIALS") {
            self.trials = n;
        }
        if let Some(n) = parse_var(&lookup, "PARADOX_SEED") {
            self.seed = n;
        }
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(n) = file.agents {
            self.agents = n;
        }
        if let Some(n) = file.problems {
            self.problems = n;
        }
        if let Some(n) = file.trials {
            self.trials = n;
        }
        if let Some(n) = file.seed {
            self.seed = n;
        }
        if let Some(name) = file.strategy {
            self.strategy = name
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid strategy in config file")?;
        }
        if let Some(parallel) = file.parallel {
            self.parallel = parallel;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(n) = overrides.agents {
            self.agents = n;
        }
        if let Some(n) = overrides.problems {
            self.problems = n;
        }
        if let Some(n) = overrides.trials {
            self.trials = n;
        }
        if let Some(n) = overrides.seed {
            self.seed = n;
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        if overrides.parallel {
            self.parallel = true;
        }
    }

    /// Build the effective configuration from every layer.
    pub fn resolve(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = Self::from_env();
        if let Some(path) = config_path {
            config.apply_file(FileConfig::load(path)?)?;
        }
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.agents == 0 {
            bail!("agents must be at least 1");
        }
        if self.problems < simulation::TOP_PROBLEM_COUNT {
            bail!(
                "problems must be at least {}, got {}",
                simulation::TOP_PROBLEM_COUNT,
                self.problems
            );
        }
        if self.trials == 0 {
            bail!("trials must be at least 1");
        }
        Ok(())
    }

    pub fn trial_config(&self) -> TrialConfig {
        TrialConfig {
            agents: self.agents,
            problems: self.problems,
            trials: self.trials,
            seed: self.seed,
            parallel: self.parallel,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.agents, 100);
        assert_eq!(config.problems, 100);
        assert_eq!(config.trials, 2000);
        assert_eq!(config.strategy, StrategySelection::All);
        assert!(!config.parallel);
    }

    #[test]
    fn test_env_overlay() {
        let vars = env(&[
            ("PARADOX_AGENTS", "50"),
            ("PARADOX_SEED", "42"),
            ("PARADOX_TRIALS", "many"),
        ]);
        let mut config = RunnerConfig::default();
        config.apply_env(|key| vars.get(key).cloned());

        assert_eq!(config.agents, 50);
        assert_eq!(config.seed, 42);
        assert_eq!(config.trials, 2000, "bad value leaves the default");
        assert_eq!(config.problems, 100);
    }

    #[test]
    fn test_file_beats_env_and_cli_beats_file() {
        let vars = env(&[("PARADOX_AGENTS", "50"), ("PARADOX_PROBLEMS", "30")]);
        let mut config = RunnerConfig::default();
        config.apply_env(|key| vars.get(key).cloned());

        let file = FileConfig::parse("agents = 70\nstrategy = \"direct\"\n").unwrap();
        config.apply_file(file).unwrap();
        assert_eq!(config.agents, 70);
        assert_eq!(config.problems, 30);
        assert_eq!(config.strategy, StrategySelection::Single(Strategy::Direct));

        config.apply_overrides(Overrides {
            agents: Some(90),
            strategy: Some(StrategySelection::All),
            ..Default::default()
        });
        assert_eq!(config.agents, 90);
        assert_eq!(config.problems, 30);
        assert_eq!(config.strategy, StrategySelection::All);
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        assert!(FileConfig::parse("agents = 5\ncolour = \"red\"\n").is_err());
    }

    #[test]
    fn test_file_rejects_unknown_strategy() {
        let file = FileConfig::parse("strategy = \"monarchy\"\n").unwrap();
        let mut config = RunnerConfig::default();
        assert!(config.apply_file(file).is_err());
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!("all".parse::<StrategySelection>(), Ok(StrategySelection::All));
        assert_eq!(
            "experts-only".parse::<StrategySelection>(),
            Ok(StrategySelection::Single(Strategy::ExpertsOnly))
        );
        assert!("none".parse::<StrategySelection>().is_err());
        assert_eq!(StrategySelection::All.strategies().len(), 3);
        assert_eq!(
            StrategySelection::Single(Strategy::Direct).strategies(),
            vec![Strategy::Direct]
        );
    }

    #[test]
    fn test_validate() {
        assert!(RunnerConfig::default().validate().is_ok());

        let config = RunnerConfig {
            problems: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RunnerConfig {
            agents: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RunnerConfig {
            trials: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trial_config() {
        let config = RunnerConfig {
            agents: 12,
            seed: 3,
            parallel: true,
            ..Default::default()
        };
        let trial = config.trial_config();
        assert_eq!(trial.agents, 12);
        assert_eq!(trial.problems, 100);
        assert_eq!(trial.seed, 3);
        assert!(trial.parallel);
    }
}
