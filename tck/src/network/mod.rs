//! Simulated ledger network.
//!
//! An in-process implementation of [`ledger_common::LedgerNetwork`] with the
//! behaviour the suite relies on: signature requirements per operation,
//! token association, fee charging, receipts and records, and a mirror feed
//! that lags consensus.
//!
//! ```rust,ignore
//! use ledger_tck::network::SimulatedNetwork;
//!
//! let network = SimulatedNetwork::builder()
//!     .with_clock(clock)
//!     .with_account(AccountId::new(1001), key.public_key(), Hbar::new(1000))
//!     .build();
//! ```

mod fees;
mod simulated;
mod state;

pub use fees::FeeSchedule;
pub use simulated::{SimulatedNetwork, SimulatedNetworkBuilder, DEFAULT_MIRROR_LAG};
pub use state::MAX_TOKEN_DECIMALS;

use ledger_common::{Transaction, TransactionRecord};

/// A transaction that reached consensus together with its record.
#[derive(Debug, Clone)]
pub struct ProcessedTransaction {
    /// The signed transaction as submitted.
    pub transaction: Transaction,
    /// Its record.
    pub record: TransactionRecord,
}
