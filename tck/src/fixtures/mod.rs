//! Scenario fixtures: test accounts, the per-scenario context, balance
//! reconciliation and multi-party transfers.

mod accounts;
mod context;
mod reconcile;
mod transfer;

pub use accounts::{TestAccount, TREASURY_INDEX};
pub use context::{ContextError, PendingTransfer, ScenarioContext};
pub use reconcile::{
    ObservedBalance, ReconcileError, Reconciler, ShortfallPolicy, UnknownShortfallPolicy,
};
pub use transfer::{
    MultiPartyTransfer, SettlementMode, SkippedLeg, TransferError, TransferLeg, TransferOutcome,
    UnknownSettlementMode,
};
