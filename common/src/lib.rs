//! # ledger_common
//!
//! Client-side types for a distributed ledger exposing a token service and
//! a consensus (topic) service:
//!
//! - entity ids ([`AccountId`], [`TokenId`], [`TopicId`]) and [`TransactionId`]
//! - Ed25519 keys and threshold [`KeyList`]s
//! - transactions, receipts, records and query results
//! - the [`LedgerNetwork`] capability trait and the [`Client`] wrapping it

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod crypto;
pub mod error;
pub mod hbar;
pub mod id;
pub mod network;
pub mod query;
pub mod receipt;
pub mod transaction;

pub use client::{Client, Operator};
pub use crypto::{Key, KeyList, PrivateKey, PublicKey};
pub use error::{ErrorKind, LedgerError};
pub use hbar::Hbar;
pub use id::{AccountId, TokenId, TopicId, TransactionId};
pub use network::LedgerNetwork;
pub use query::{AccountBalance, TokenInfo, TopicInfo, TopicMessage};
pub use receipt::{Status, TransactionReceipt, TransactionRecord, TransactionResponse};
pub use transaction::{TokenCreate, TokenTransfer, Transaction, TransactionBody};
