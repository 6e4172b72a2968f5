//! Step definitions and matching.
//!
//! Every definition is a regular expression anchored at both ends and
//! matched against the step text regardless of its keyword. Capture groups
//! become the step arguments.

use std::str::FromStr;

use futures::future::BoxFuture;
use regex_lite::Regex;
use thiserror::Error;

use super::parser::{Feature, Step};
use super::runner::World;
use crate::error::StepFailure;

/// Future returned by a step handler.
pub type StepFuture<'a> = BoxFuture<'a, Result<(), StepFailure>>;

/// A step handler.
pub type StepFn = for<'a> fn(&'a mut World, StepArgs) -> StepFuture<'a>;

/// Errors raised when looking up a step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No definition matches.
    #[error("Undefined step: {0}")]
    Undefined(String),

    /// More than one definition matches.
    #[error("Ambiguous step '{text}' matches {patterns:?}")]
    Ambiguous {
        /// Step text.
        text: String,
        /// Matching patterns.
        patterns: Vec<String>,
    },
}

/// Captured arguments of a matched step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    captures: Vec<String>,
}

impl StepArgs {
    /// Arguments from captured strings.
    pub fn new(captures: Vec<String>) -> Self {
        Self { captures }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Argument `index` as text.
    pub fn str(&self, index: usize) -> Result<&str, StepFailure> {
        self.captures
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| StepFailure::InvalidArgument(format!("Missing argument #{}", index)))
    }

    /// Argument `index` parsed as `T`.
    pub fn get<T>(&self, index: usize) -> Result<T, StepFailure>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.str(index)?;
        raw.parse().map_err(|err| {
            StepFailure::InvalidArgument(format!("Cannot parse argument '{}': {}", raw, err))
        })
    }
}

/// A registered step pattern and its handler.
pub struct StepDefinition {
    pattern: Regex,
    source: String,
    handler: StepFn,
}

impl StepDefinition {
    /// Pattern as written at registration.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Handler.
    pub fn handler(&self) -> StepFn {
        self.handler
    }
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.source)
            .finish()
    }
}

/// A step that does not resolve to exactly one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedStep {
    /// Scenario name, or `Background`.
    pub scenario: String,
    /// Line of the step.
    pub line: usize,
    /// Why it does not resolve.
    pub error: MatchError,
}

/// Collection of step definitions.
#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for steps matching `pattern`.
    pub fn register(&mut self, pattern: &str, handler: StepFn) -> Result<(), regex_lite::Error> {
        let regex = Regex::new(&format!("^{}$", pattern))?;
        self.definitions.push(StepDefinition {
            pattern: regex,
            source: pattern.to_string(),
            handler,
        });
        Ok(())
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no step is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve `text` to its definition and arguments.
    pub fn find(&self, text: &str) -> Result<(&StepDefinition, StepArgs), MatchError> {
        let mut found: Vec<(&StepDefinition, StepArgs)> = self
            .definitions
            .iter()
            .filter_map(|definition| {
                definition.pattern.captures(text).map(|captures| {
                    let args = captures
                        .iter()
                        .skip(1)
                        .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                        .collect();
                    (definition, StepArgs::new(args))
                })
            })
            .collect();

        match found.len() {
            0 => Err(MatchError::Undefined(text.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(MatchError::Ambiguous {
                text: text.to_string(),
                patterns: found
                    .iter()
                    .map(|(definition, _)| definition.source.clone())
                    .collect(),
            }),
        }
    }

    /// Steps of `feature` that do not resolve to exactly one definition.
    pub fn check(&self, feature: &Feature) -> Vec<UnresolvedStep> {
        let background = feature
            .background
            .iter()
            .map(|step| ("Background", step));
        let scenarios = feature.scenarios.iter().flat_map(|scenario| {
            scenario
                .steps
                .iter()
                .map(move |step| (scenario.name.as_str(), step))
        });

        background
            .chain(scenarios)
            .filter_map(|(scenario, step): (&str, &Step)| {
                self.find(&step.text).err().map(|error| UnresolvedStep {
                    scenario: scenario.to_string(),
                    line: step.line,
                    error,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::parser::parse_feature;

    fn noop(_world: &mut World, _args: StepArgs) -> StepFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry
            .register(r"The (first|second) account holds (\d+) HTT tokens", noop)
            .unwrap();
        registry
            .register(r"The token has (\d+) decimals", noop)
            .unwrap();
        registry
    }

    #[test]
    fn test_find_captures_arguments() {
        let registry = registry();
        let (definition, args) = registry.find("The second account holds 110 HTT tokens").unwrap();

        assert_eq!(definition.pattern(), r"The (first|second) account holds (\d+) HTT tokens");
        assert_eq!(args.len(), 2);
        assert_eq!(args.str(0).unwrap(), "second");
        assert_eq!(args.get::<u64>(1).unwrap(), 110);
        assert!(args.get::<u64>(0).is_err());
        assert!(args.str(2).is_err());
    }

    #[test]
    fn test_patterns_are_anchored() {
        let registry = registry();
        assert!(matches!(
            registry.find("The token has 2 decimals!"),
            Err(MatchError::Undefined(_))
        ));
    }

    #[test]
    fn test_ambiguous() {
        let mut registry = registry();
        registry.register(r"The token has (.+) decimals", noop).unwrap();

        match registry.find("The token has 2 decimals") {
            Err(MatchError::Ambiguous { patterns, .. }) => assert_eq!(patterns.len(), 2),
            other => panic!(
                "expected ambiguity, got {:?}",
                other.map(|(d, _)| d.pattern().to_string())
            ),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let mut registry = StepRegistry::new();
        assert!(registry.register(r"unclosed (group", noop).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_check_reports_unresolved_steps() {
        let feature = parse_feature(
            "Feature: F\n  Background:\n    Given nothing matches\n  Scenario: S\n    Then The token has 2 decimals\n    And The third account holds 5 HTT tokens\n",
        )
        .unwrap();

        let unresolved = registry().check(&feature);
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0].scenario, "Background");
        assert_eq!(unresolved[0].line, 3);
        assert_eq!(unresolved[1].scenario, "S");
        assert_eq!(unresolved[1].line, 6);
    }
}
