//! Ledger client errors.

use thiserror::Error;

use crate::crypto::KeyError;
use crate::id::{InvalidEntityId, TransactionId};
use crate::receipt::Status;

/// Broad class of a ledger failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading state from the network failed.
    Query,
    /// A transaction was rejected at or after submission.
    Submission,
}

/// Errors produced by the ledger client and networks.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node refused the transaction before consensus.
    #[error("Transaction {transaction_id} failed precheck with status {status}")]
    Precheck {
        /// Rejected transaction.
        transaction_id: TransactionId,
        /// Precheck status.
        status: Status,
    },

    /// The transaction reached consensus but was not applied.
    #[error("Receipt for transaction {transaction_id} contained error status {status}")]
    ReceiptStatus {
        /// Failed transaction.
        transaction_id: TransactionId,
        /// Receipt status.
        status: Status,
    },

    /// A query was answered with an error status.
    #[error("Query failed with status {status}: {message}")]
    QueryStatus {
        /// Query status.
        status: Status,
        /// What was being queried.
        message: String,
    },

    /// Signing or submitting a transaction that has not been frozen.
    #[error("Transaction must be frozen before it is signed or executed")]
    NotFrozen,

    /// Executing without a payer.
    #[error("Client has no operator configured")]
    NoOperator,

    /// Malformed key material.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Malformed entity id.
    #[error(transparent)]
    EntityId(#[from] InvalidEntityId),

    /// Transaction body could not be encoded.
    #[error("Failed to encode transaction body: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Transport level failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl LedgerError {
    /// Classify the failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::QueryStatus { .. } | LedgerError::Network(_) => ErrorKind::Query,
            LedgerError::Precheck { .. }
            | LedgerError::ReceiptStatus { .. }
            | LedgerError::NotFrozen
            | LedgerError::NoOperator
            | LedgerError::Key(_)
            | LedgerError::EntityId(_)
            | LedgerError::Encoding(_) => ErrorKind::Submission,
        }
    }

    /// Network status carried by the error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            LedgerError::Precheck { status, .. }
            | LedgerError::ReceiptStatus { status, .. }
            | LedgerError::QueryStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
