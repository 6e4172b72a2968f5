//! Run reports.

use serde::Serialize;
use std::time::Duration;

use super::parser::StepKeyword;
use crate::error::FailureClass;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// Ran and succeeded.
    Passed,
    /// Ran and failed.
    Failed {
        /// Failure class.
        class: FailureClass,
        /// Failure message.
        message: String,
    },
    /// No or several matching definitions.
    Undefined {
        /// Lookup error.
        message: String,
    },
    /// Not run because an earlier step failed.
    Skipped,
}

/// Report of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Effective keyword.
    pub keyword: StepKeyword,
    /// Step text.
    pub text: String,
    /// Line in the feature file.
    pub line: usize,
    /// Outcome.
    #[serde(flatten)]
    pub status: StepStatus,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Report of one scenario, background steps included.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Line of the `Scenario:` keyword.
    pub line: usize,
    /// Effective tags.
    pub tags: Vec<String>,
    /// Steps in execution order.
    pub steps: Vec<StepReport>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Whether every step passed.
    pub fn passed(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status == StepStatus::Passed)
    }

    /// First step that did not pass.
    pub fn first_failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|step| {
            matches!(
                step.status,
                StepStatus::Failed { .. } | StepStatus::Undefined { .. }
            )
        })
    }
}

/// Report of one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    /// Feature name.
    pub name: String,
    /// Source file, if the feature was loaded from disk.
    pub path: Option<String>,
    /// Scenarios selected by the tag filter.
    pub scenarios: Vec<ScenarioReport>,
}

/// Report of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Features in run order.
    pub features: Vec<FeatureReport>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature.
    pub fn add_feature(&mut self, feature: FeatureReport) {
        self.features.push(feature);
    }

    /// Set the total duration.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
    }

    /// Every scenario of every feature.
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.features
            .iter()
            .flat_map(|feature| feature.scenarios.iter())
    }

    /// Number of scenarios run.
    pub fn total(&self) -> usize {
        self.scenarios().count()
    }

    /// Number of passed scenarios.
    pub fn passed(&self) -> usize {
        self.scenarios().filter(|scenario| scenario.passed()).count()
    }

    /// Number of failed scenarios.
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Whether every scenario passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Print human-readable summary
    pub fn print_summary(&self) {
        println!("\n=== Ledger BDD Report ===\n");
        for feature in &self.features {
            println!("Feature: {}", feature.name);
            for scenario in &feature.scenarios {
                let mark = if scenario.passed() { "✓" } else { "✗" };
                println!("  {} {} ({}ms)", mark, scenario.name, scenario.duration_ms);
                for step in &scenario.steps {
                    match &step.status {
                        StepStatus::Passed => {}
                        StepStatus::Skipped => {
                            println!("      - {} {} (skipped)", step.keyword, step.text)
                        }
                        StepStatus::Failed { class, message } => {
                            println!("      ✗ {} {} [line {}]", step.keyword, step.text, step.line);
                            println!("        {:?}: {}", class, message);
                        }
                        StepStatus::Undefined { message } => {
                            println!("      ? {} {} [line {}]", step.keyword, step.text, step.line);
                            println!("        {}", message);
                        }
                    }
                }
            }
            println!();
        }

        println!(
            "Total: {} | Passed: {} | Failed: {}",
            self.total(),
            self.passed(),
            self.failed()
        );
        println!("Duration: {:.2}s\n", self.duration_ms as f64 / 1000.0);
        println!(
            "Result: {}",
            if self.all_passed() { "PASS" } else { "FAIL" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(status: StepStatus) -> StepReport {
        StepReport {
            keyword: StepKeyword::Given,
            text: "step".to_string(),
            line: 1,
            status,
            duration_ms: 0,
        }
    }

    fn scenario(steps: Vec<StepReport>) -> ScenarioReport {
        ScenarioReport {
            name: "s".to_string(),
            line: 1,
            tags: Vec::new(),
            steps,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_counts() {
        let mut report = RunReport::new();
        report.add_feature(FeatureReport {
            name: "f".to_string(),
            path: None,
            scenarios: vec![
                scenario(vec![step(StepStatus::Passed)]),
                scenario(vec![
                    step(StepStatus::Failed {
                        class: FailureClass::Assertion,
                        message: "boom".to_string(),
                    }),
                    step(StepStatus::Skipped),
                ]),
            ],
        });

        assert_eq!(report.total(), 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());

        let failing = &report.features[0].scenarios[1];
        assert_eq!(failing.first_failure().map(|s| s.line), Some(1));
    }

    #[test]
    fn test_json_shape() {
        let mut report = RunReport::new();
        report.add_feature(FeatureReport {
            name: "f".to_string(),
            path: Some("f.feature".to_string()),
            scenarios: vec![scenario(vec![step(StepStatus::Undefined {
                message: "Undefined step: x".to_string(),
            })])],
        });

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        let step = &json["features"][0]["scenarios"][0]["steps"][0];
        assert_eq!(step["status"], "undefined");
        assert_eq!(step["keyword"], "Given");
    }
}
