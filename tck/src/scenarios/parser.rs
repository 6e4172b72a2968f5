//! Feature file parser.
//!
//! Supports the subset of Gherkin the suite uses:
//!
//! ```gherkin
//! @token
//! Feature: Token Service
//!
//!   Background:
//!     Given A Hedera account with more than 10 hbar
//!
//!   Scenario: Create a mintable token
//!     Given A token named Test Token (HTT)
//!     Then The token has the name "Test Token"
//!     And The token has the symbol "HTT"
//! ```
//!
//! `And`, `But` and `*` take the keyword of the step before them. Tables,
//! doc strings and scenario outlines are rejected.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

/// Keyword a step is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKeyword {
    /// Precondition.
    Given,
    /// Action.
    When,
    /// Outcome.
    Then,
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKeyword::Given => f.write_str("Given"),
            StepKeyword::When => f.write_str("When"),
            StepKeyword::Then => f.write_str("Then"),
        }
    }
}

/// One step line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Effective keyword.
    pub keyword: StepKeyword,
    /// Text after the keyword.
    pub text: String,
    /// 1-based line number.
    pub line: usize,
}

/// A scenario and its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Title.
    pub name: String,
    /// Tags on the scenario itself, without `@`.
    pub tags: Vec<String>,
    /// 1-based line number of the `Scenario:` line.
    pub line: usize,
    /// Steps in order.
    pub steps: Vec<Step>,
}

/// A parsed feature file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Feature {
    /// Title.
    pub name: String,
    /// Free text between the title and the first block.
    pub description: Vec<String>,
    /// Feature tags, without `@`. Inherited by every scenario.
    pub tags: Vec<String>,
    /// Steps run before every scenario.
    pub background: Vec<Step>,
    /// Scenarios in file order.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Feature and scenario tags of `scenario`.
    pub fn effective_tags<'a>(&'a self, scenario: &'a Scenario) -> impl Iterator<Item = &'a str> {
        self.tags
            .iter()
            .chain(scenario.tags.iter())
            .map(String::as_str)
    }
}

/// Syntax error with its location.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// What is wrong.
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

enum Block {
    Header,
    Background,
    Scenario,
}

/// Parse a feature from text.
pub fn parse_feature(source: &str) -> Result<Feature, ParseError> {
    let mut feature: Option<Feature> = None;
    let mut block = Block::Header;
    let mut pending_tags: Vec<String> = Vec::new();
    let mut previous: Option<StepKeyword> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        if text.starts_with('@') {
            for tag in text.split_whitespace() {
                let name = tag
                    .strip_prefix('@')
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ParseError::new(line, format!("Invalid tag '{}'", tag)))?;
                pending_tags.push(name.to_string());
            }
            continue;
        }

        if let Some(name) = text.strip_prefix("Feature:") {
            if feature.is_some() {
                return Err(ParseError::new(line, "Only one Feature per file"));
            }
            feature = Some(Feature {
                name: name.trim().to_string(),
                tags: std::mem::take(&mut pending_tags),
                ..Feature::default()
            });
            continue;
        }

        let current = feature
            .as_mut()
            .ok_or_else(|| ParseError::new(line, "Expected 'Feature:' before any other content"))?;

        if text.starts_with("Background:") {
            if !current.scenarios.is_empty() {
                return Err(ParseError::new(line, "Background must precede all scenarios"));
            }
            if !current.background.is_empty() {
                return Err(ParseError::new(line, "Only one Background per feature"));
            }
            if !pending_tags.is_empty() {
                return Err(ParseError::new(line, "Background cannot be tagged"));
            }
            block = Block::Background;
            previous = None;
            continue;
        }

        if let Some(name) = text
            .strip_prefix("Scenario:")
            .or_else(|| text.strip_prefix("Example:"))
        {
            current.scenarios.push(Scenario {
                name: name.trim().to_string(),
                tags: std::mem::take(&mut pending_tags),
                line,
                steps: Vec::new(),
            });
            block = Block::Scenario;
            previous = None;
            continue;
        }

        if text.starts_with("Scenario Outline:")
            || text.starts_with("Scenario Template:")
            || text.starts_with("Examples:")
            || text.starts_with("Rule:")
        {
            return Err(ParseError::new(line, format!("Unsupported construct '{}'", text)));
        }
        if text.starts_with('|') || text.starts_with("\"\"\"") || text.starts_with("```") {
            return Err(ParseError::new(line, "Step arguments are not supported"));
        }

        if let Some((keyword, rest)) = split_step(text) {
            let keyword = match keyword {
                Some(keyword) => keyword,
                None => previous.ok_or_else(|| {
                    ParseError::new(line, "'And', 'But' or '*' cannot start a block")
                })?,
            };
            let step = Step {
                keyword,
                text: rest.to_string(),
                line,
            };
            match block {
                Block::Header => {
                    return Err(ParseError::new(line, "Step outside of a Background or Scenario"))
                }
                Block::Background => current.background.push(step),
                Block::Scenario => {
                    if let Some(scenario) = current.scenarios.last_mut() {
                        scenario.steps.push(step);
                    }
                }
            }
            previous = Some(keyword);
            continue;
        }

        match block {
            Block::Header => current.description.push(text.to_string()),
            _ => return Err(ParseError::new(line, format!("Unexpected line '{}'", text))),
        }
    }

    let feature = feature.ok_or_else(|| ParseError::new(1, "No Feature found"))?;
    if !pending_tags.is_empty() {
        return Err(ParseError::new(
            source.lines().count(),
            "Tags at end of file are not attached to anything",
        ));
    }
    Ok(feature)
}

/// Parse a feature file.
pub fn parse_feature_file(path: &Path) -> Result<Feature> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature file: {}", path.display()))?;
    parse_feature(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Split `Keyword text`. `None` as keyword means it inherits the previous one.
fn split_step(text: &str) -> Option<(Option<StepKeyword>, &str)> {
    const KEYWORDS: [(&str, Option<StepKeyword>); 6] = [
        ("Given ", Some(StepKeyword::Given)),
        ("When ", Some(StepKeyword::When)),
        ("Then ", Some(StepKeyword::Then)),
        ("And ", None),
        ("But ", None),
        ("* ", None),
    ];
    KEYWORDS.iter().find_map(|(prefix, keyword)| {
        text.strip_prefix(prefix)
            .map(|rest| (*keyword, rest.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = r#"
# comment
@token @smoke
Feature: Token Service
  Exercises the token service.

  Background:
    Given A Hedera account with more than 10 hbar

  @mint
  Scenario: Create a mintable token
    Given A token named Test Token (HTT)
    Then The token has the name "Test Token"
    And The token has the symbol "HTT"
    But The token has 2 decimals

  Scenario: Second
    When The first account submits the transaction
"#;

    #[test]
    fn test_parse_feature() {
        let feature = parse_feature(FEATURE).unwrap();

        assert_eq!(feature.name, "Token Service");
        assert_eq!(feature.tags, vec!["token", "smoke"]);
        assert_eq!(feature.description, vec!["Exercises the token service."]);
        assert_eq!(feature.background.len(), 1);
        assert_eq!(feature.scenarios.len(), 2);

        let scenario = &feature.scenarios[0];
        assert_eq!(scenario.name, "Create a mintable token");
        assert_eq!(scenario.tags, vec!["mint"]);
        assert_eq!(scenario.line, 11);
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[2].keyword, StepKeyword::Then);
        assert_eq!(scenario.steps[2].text, "The token has the symbol \"HTT\"");
        assert_eq!(scenario.steps[3].keyword, StepKeyword::Then);
        assert_eq!(scenario.steps[3].line, 15);

        let tags: Vec<_> = feature.effective_tags(scenario).collect();
        assert_eq!(tags, vec!["token", "smoke", "mint"]);
        assert!(feature.scenarios[1].tags.is_empty());
    }

    #[test]
    fn test_and_cannot_start_block() {
        let err = parse_feature("Feature: F\n  Scenario: S\n    And something\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_rejects_unsupported_constructs() {
        let err = parse_feature("Feature: F\n  Scenario Outline: S\n").unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse_feature("Feature: F\n  Scenario: S\n    Given x\n    | a | b |\n")
            .unwrap_err();
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_requires_feature() {
        assert!(parse_feature("Scenario: S\n").is_err());
        assert!(parse_feature("# only a comment\n").is_err());
        assert!(parse_feature("Feature: A\nFeature: B\n").is_err());
    }

    #[test]
    fn test_background_after_scenario_rejected() {
        let source = "Feature: F\n  Scenario: S\n    Given x\n  Background:\n    Given y\n";
        assert_eq!(parse_feature(source).unwrap_err().line, 4);
    }

    #[test]
    fn test_parse_feature_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.feature");
        std::fs::write(&path, FEATURE).unwrap();

        let feature = parse_feature_file(&path).unwrap();
        assert_eq!(feature.scenarios.len(), 2);
        assert!(parse_feature_file(&dir.path().join("missing.feature")).is_err());
    }
}
