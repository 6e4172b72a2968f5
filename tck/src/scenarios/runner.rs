//! Feature execution engine.
//!
//! Each scenario runs against a fresh [`World`]: a new scenario context and
//! a client whose operator is the treasury. The network is shared, so
//! ledger state carries over between scenarios and features. Steps run in
//! order; after the first failure the remaining steps are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use ledger_common::{Client, LedgerNetwork};

use super::parser::{parse_feature_file, Feature, Scenario, Step};
use super::registry::StepRegistry;
use super::report::{FeatureReport, RunReport, ScenarioReport, StepReport, StepStatus};
use crate::config::SuiteConfig;
use crate::error::StepFailure;
use crate::fixtures::{Reconciler, ScenarioContext, TestAccount};

/// State shared by the steps of one scenario.
pub struct World {
    /// Client used by steps; its operator pays fees.
    pub client: Client,
    /// Scenario-scoped values.
    pub context: ScenarioContext,
    /// Suite configuration.
    pub config: Arc<SuiteConfig>,
}

impl World {
    /// Fresh world with the treasury as operator.
    pub fn new(
        network: Arc<dyn LedgerNetwork>,
        config: Arc<SuiteConfig>,
    ) -> Result<Self, StepFailure> {
        let mut context = ScenarioContext::new(config.clone());
        let treasury = context.treasury()?;
        let client = Client::new(network).with_operator(treasury.id, treasury.key);
        Ok(Self {
            client,
            context,
            config,
        })
    }

    /// Account at `index`.
    pub fn account(&mut self, index: usize) -> Result<TestAccount, StepFailure> {
        Ok(self.context.account(index)?)
    }

    /// Make the account at `index` the operator and return it.
    pub fn use_operator(&mut self, index: usize) -> Result<TestAccount, StepFailure> {
        let account = self.account(index)?;
        self.client.set_operator(account.id, account.key.clone());
        Ok(account)
    }

    /// Reconciler using the configured shortfall policy.
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.client, self.config.shortfall_policy)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("client", &self.client)
            .field("context", &self.context)
            .finish()
    }
}

/// Runs features against one network.
pub struct FeatureRunner {
    registry: StepRegistry,
    network: Arc<dyn LedgerNetwork>,
    config: Arc<SuiteConfig>,
    tags: Vec<String>,
}

impl FeatureRunner {
    /// Runner with every built-in step registered.
    pub fn new(network: Arc<dyn LedgerNetwork>, config: Arc<SuiteConfig>) -> Result<Self> {
        Ok(Self::with_registry(crate::steps::registry()?, network, config))
    }

    /// Runner using `registry`.
    pub fn with_registry(
        registry: StepRegistry,
        network: Arc<dyn LedgerNetwork>,
        config: Arc<SuiteConfig>,
    ) -> Self {
        Self {
            registry,
            network,
            config,
            tags: Vec::new(),
        }
    }

    /// Only run scenarios carrying one of `tags`. Leading `@` is optional.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim_start_matches('@').to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    /// Step definitions in use.
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Whether the tag filter selects `scenario`.
    pub fn selects(&self, feature: &Feature, scenario: &Scenario) -> bool {
        self.tags.is_empty()
            || feature
                .effective_tags(scenario)
                .any(|tag| self.tags.iter().any(|wanted| wanted == tag))
    }

    /// Parse and run feature files in order.
    pub async fn run_files(&self, paths: &[PathBuf]) -> Result<RunReport> {
        let start = Instant::now();
        let mut features = Vec::with_capacity(paths.len());
        for path in paths {
            features.push((path, parse_feature_file(path)?));
        }

        for (path, feature) in &features {
            let unresolved = self.registry.check(feature);
            if let Some(first) = unresolved.first() {
                return Err(anyhow!(
                    "{}:{}: {} ({} unresolved step(s))",
                    path.display(),
                    first.line,
                    first.error,
                    unresolved.len()
                ));
            }
        }

        let mut report = RunReport::new();
        for (path, feature) in &features {
            report.add_feature(self.run_feature(feature, Some(path)).await);
        }
        report.set_duration(start.elapsed());
        Ok(report)
    }

    /// Run every selected scenario of `feature`.
    pub async fn run_feature(&self, feature: &Feature, path: Option<&Path>) -> FeatureReport {
        if log::log_enabled!(log::Level::Info) {
            log::info!("Feature: {}", feature.name);
        }
        let mut scenarios = Vec::new();
        for scenario in &feature.scenarios {
            if self.selects(feature, scenario) {
                scenarios.push(self.run_scenario(feature, scenario).await);
            }
        }
        FeatureReport {
            name: feature.name.clone(),
            path: path.map(|path| path.display().to_string()),
            scenarios,
        }
    }

    /// Run the background and steps of `scenario` against a fresh world.
    pub async fn run_scenario(&self, feature: &Feature, scenario: &Scenario) -> ScenarioReport {
        if log::log_enabled!(log::Level::Info) {
            log::info!("Scenario: {} (line {})", scenario.name, scenario.line);
        }
        let start = Instant::now();
        let steps: Vec<&Step> = feature
            .background
            .iter()
            .chain(scenario.steps.iter())
            .collect();

        let mut reports = Vec::with_capacity(steps.len());
        let mut world = match World::new(self.network.clone(), self.config.clone()) {
            Ok(world) => Some(world),
            Err(err) => {
                if log::log_enabled!(log::Level::Error) {
                    log::error!("Cannot set up scenario '{}': {}", scenario.name, err);
                }
                if let Some(first) = steps.first() {
                    reports.push(step_report(
                        first,
                        StepStatus::Failed {
                            class: err.class(),
                            message: err.to_string(),
                        },
                        0,
                    ));
                }
                None
            }
        };

        for step in steps.iter().skip(reports.len()) {
            let Some(current) = world.as_mut() else {
                reports.push(step_report(step, StepStatus::Skipped, 0));
                continue;
            };
            let step_start = Instant::now();
            let status = self.run_step(current, step).await;
            let failed = status != StepStatus::Passed;
            reports.push(step_report(
                step,
                status,
                step_start.elapsed().as_millis() as u64,
            ));
            if failed {
                world = None;
            }
        }

        ScenarioReport {
            name: scenario.name.clone(),
            line: scenario.line,
            tags: feature
                .effective_tags(scenario)
                .map(str::to_string)
                .collect(),
            steps: reports,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn run_step(&self, world: &mut World, step: &Step) -> StepStatus {
        let (definition, args) = match self.registry.find(&step.text) {
            Ok(found) => found,
            Err(err) => {
                if log::log_enabled!(log::Level::Error) {
                    log::error!("line {}: {}", step.line, err);
                }
                return StepStatus::Undefined {
                    message: err.to_string(),
                };
            }
        };
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("{} {} -> /{}/", step.keyword, step.text, definition.pattern());
        }

        match (definition.handler())(world, args).await {
            Ok(()) => StepStatus::Passed,
            Err(err) => {
                if log::log_enabled!(log::Level::Error) {
                    log::error!(
                        "Step failed at line {}: {} {}: {}",
                        step.line,
                        step.keyword,
                        step.text,
                        err
                    );
                }
                StepStatus::Failed {
                    class: err.class(),
                    message: err.to_string(),
                }
            }
        }
    }
}

fn step_report(step: &Step, status: StepStatus, duration_ms: u64) -> StepReport {
    StepReport {
        keyword: step.keyword,
        text: step.text.clone(),
        line: step.line,
        status,
        duration_ms,
    }
}
