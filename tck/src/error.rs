//! Step failures.

use ledger_common::{ErrorKind, LedgerError};
use thiserror::Error;

use crate::fixtures::{ContextError, ReconcileError, TransferError};

/// Broad class of a step failure, shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Reading ledger state failed.
    Query,
    /// A transaction was rejected.
    Submission,
    /// Observed state differs from the expectation.
    Assertion,
    /// Setting up balances or transfers failed.
    Fixture,
    /// A step read a value no earlier step produced.
    MissingContext,
    /// A step argument could not be used.
    InvalidArgument,
    /// Waiting for the mirror feed timed out.
    Timeout,
}

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// Observed state differs from the expectation.
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// A ledger query failed.
    #[error("Query failed: {0}")]
    Query(#[source] LedgerError),

    /// A transaction was rejected.
    #[error("Submission failed: {0}")]
    Submission(#[source] LedgerError),

    /// Balance reconciliation failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A transfer could not be settled.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Scenario context lookup failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A step argument could not be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A wait expired.
    #[error("{0}")]
    Timeout(String),
}

impl From<LedgerError> for StepFailure {
    fn from(err: LedgerError) -> Self {
        match err.kind() {
            ErrorKind::Query => StepFailure::Query(err),
            ErrorKind::Submission => StepFailure::Submission(err),
        }
    }
}

impl StepFailure {
    /// Classify the failure.
    pub fn class(&self) -> FailureClass {
        match self {
            StepFailure::Assertion(_) => FailureClass::Assertion,
            StepFailure::Query(_) => FailureClass::Query,
            StepFailure::Submission(_) => FailureClass::Submission,
            StepFailure::Reconcile(ReconcileError::QueryFailed(_))
            | StepFailure::Transfer(TransferError::Query(_)) => FailureClass::Query,
            StepFailure::Transfer(TransferError::Submission(_)) => FailureClass::Submission,
            StepFailure::Reconcile(_) | StepFailure::Transfer(_) => FailureClass::Fixture,
            StepFailure::Context(_) => FailureClass::MissingContext,
            StepFailure::InvalidArgument(_) => FailureClass::InvalidArgument,
            StepFailure::Timeout(_) => FailureClass::Timeout,
        }
    }
}

/// Fail with [`StepFailure::Assertion`] unless `cond` holds.
#[macro_export]
macro_rules! ensure_step {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::StepFailure::Assertion(format!($($arg)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_common::{AccountId, Status, TransactionId};

    #[test]
    fn test_ledger_errors_classified_by_kind() {
        let query: StepFailure = LedgerError::QueryStatus {
            status: Status::InvalidTokenId,
            message: "token info".to_string(),
        }
        .into();
        assert_eq!(query.class(), FailureClass::Query);

        let submission: StepFailure = LedgerError::ReceiptStatus {
            transaction_id: TransactionId::generate(AccountId::new(2)),
            status: Status::TokenHasNoSupplyKey,
        }
        .into();
        assert_eq!(submission.class(), FailureClass::Submission);
    }

    #[test]
    fn test_context_and_fixture_classes() {
        let missing: StepFailure = ContextError::Missing("tokenId").into();
        assert_eq!(missing.class(), FailureClass::MissingContext);
        assert_eq!(missing.to_string(), "No tokenId in scenario context");

        let shortfall: StepFailure = ReconcileError::InsufficientTreasury {
            token_id: ledger_common::TokenId::new(9),
            available: 1,
            required: 2,
        }
        .into();
        assert_eq!(shortfall.class(), FailureClass::Fixture);
    }

    fn check(value: u64) -> Result<(), StepFailure> {
        ensure_step!(value > 10, "expected more than 10, got {}", value);
        Ok(())
    }

    #[test]
    fn test_ensure_step() {
        assert!(check(11).is_ok());
        let err = check(3).unwrap_err();
        assert_eq!(err.class(), FailureClass::Assertion);
        assert_eq!(err.to_string(), "Assertion failed: expected more than 10, got 3");
    }
}
