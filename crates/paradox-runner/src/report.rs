//! Report rendering for the runner

use crate::config::RunnerConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use simulation::{format_comparison, TrialReport};

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Everything a run produced, with the settings that produced it
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub config: RunnerConfig,
    pub reports: Vec<TrialReport>,
}

impl RunSummary {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Markdown => Ok(self.to_markdown()),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize run summary")
            }
        }
    }

    fn to_markdown(&self) -> String {
        let mut out = format_comparison(&self.reports);
        out.push_str(&format!(
            "\nAgents: {}, problems: {}, trials per strategy: {}, seed: {}\n",
            self.config.agents, self.config.problems, self.config.trials, self.config.seed
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::{compute_report, OutcomeCode, Strategy, StrategyOutcome, TrialRecord};

    fn summary() -> RunSummary {
        let record = TrialRecord {
            trial: 0,
            seed: 0,
            outcome: StrategyOutcome {
                code: OutcomeCode::Success,
                steps: 120,
                problems_attempted: 12,
            },
        };
        RunSummary {
            config: RunnerConfig::default(),
            reports: vec![compute_report(Strategy::TwoLayered, &[record])],
        }
    }

    #[test]
    fn test_markdown_output() {
        let text = summary().render(OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# Strategy Comparison"));
        assert!(text.contains("| Two-layered | 1 | 1 (100.0%) |"));
        assert!(text.contains("Agents: 100, problems: 100, trials per strategy: 2000, seed: 0"));
    }

    #[test]
    fn test_json_output() {
        let text = summary().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["config"]["agents"], 100);
        assert_eq!(value["config"]["strategy"], "all");
        assert_eq!(value["reports"][0]["strategy"], "two-layered");
        assert_eq!(value["reports"][0]["steps"][0], 120);
    }
}
