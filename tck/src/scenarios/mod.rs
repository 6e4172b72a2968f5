//! Feature files: parsing, step matching, execution and reporting.

pub mod parser;
pub mod registry;
pub mod report;
pub mod runner;

pub use parser::{
    parse_feature, parse_feature_file, Feature, ParseError, Scenario, Step, StepKeyword,
};
pub use registry::{MatchError, StepArgs, StepFn, StepFuture, StepRegistry, UnresolvedStep};
pub use report::{FeatureReport, RunReport, ScenarioReport, StepReport, StepStatus};
pub use runner::{FeatureRunner, World};
