//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust,ignore
//! use ledger_tck::prelude::*;
//! ```

// Re-export orchestrator types
pub use crate::orchestrator::{Clock, PausedClock, SystemClock};

// Configuration and network
pub use crate::config::SuiteConfig;
pub use crate::network::{FeeSchedule, SimulatedNetwork, SimulatedNetworkBuilder};

// Fixtures
pub use crate::fixtures::{
    MultiPartyTransfer, ObservedBalance, Reconciler, ScenarioContext, SettlementMode,
    ShortfallPolicy, TestAccount, TransferOutcome,
};

// Scenarios
pub use crate::error::{FailureClass, StepFailure};
pub use crate::scenarios::{parse_feature, FeatureRunner, RunReport, StepRegistry, World};

// Re-export waiter primitives
pub use crate::waiters::{wait_for_topic_message, wait_for_topic_sequence};

// Ledger client types
pub use ledger_common::{AccountId, Client, Hbar, PrivateKey, TokenId, TopicId};

// Re-export commonly used external types
pub use anyhow::{anyhow, Context, Result};
pub use std::sync::Arc;
pub use tokio::time::Duration;
