//! # Ledger BDD: behaviour-driven tests for a ledger's consensus and token services
//!
//! Feature files describe scenarios in Gherkin; step definitions bind each
//! line to an async handler that submits transactions and checks query
//! results through a [`ledger_common::Client`].
//!
//! ## Architecture Overview
//!
//! - **network**: in-process simulated ledger (signatures, association,
//!   fees, receipts, lagging mirror feed)
//! - **fixtures**: per-scenario context, balance reconciler, multi-party
//!   transfer coordinator
//! - **scenarios**: feature parser, step registry, runner and reports
//! - **steps**: consensus and token service step definitions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ledger_tck::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_token_feature() {
//!     let config = Arc::new(SuiteConfig::generated(5, 1000));
//!     let network = Arc::new(
//!         SimulatedNetworkBuilder::from_config(&config)
//!             .with_clock(Arc::new(PausedClock))
//!             .build(),
//!     );
//!     let runner = FeatureRunner::new(network, config).unwrap();
//!     let report = runner
//!         .run_files(&["features/token-service.feature".into()])
//!         .await
//!         .unwrap();
//!     assert!(report.all_passed());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Clock abstraction shared by the network and waiters
pub mod orchestrator;

/// Suite configuration
pub mod config;

/// Step failure taxonomy
pub mod error;

/// Simulated ledger network
pub mod network;

/// Scenario fixtures
pub mod fixtures;

/// Feature parsing, matching and execution
pub mod scenarios;

/// Built-in step definitions
pub mod steps;

/// Poll-until-observed helpers
pub mod waiters;

/// Convenient re-exports
pub mod prelude;
