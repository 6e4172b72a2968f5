//! Account balance reconciliation.
//!
//! Given steps describe the balance an account *holds*, while the ledger may
//! already carry state from earlier scenarios. The [`Reconciler`] moves the
//! ledger towards the described state without ever taking funds away:
//!
//! 1. query the target and the treasury
//! 2. associate the token with the target if it is not associated yet
//! 3. top up from the treasury when the target holds less than desired
//!    and the treasury can cover the desired amount
//!
//! Running it twice with the same inputs transfers nothing the second time.

use std::fmt;
use std::str::FromStr;

use ledger_common::{
    AccountId, Client, LedgerError, Status, TokenId, TokenTransfer, Transaction, TransactionBody,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::accounts::TestAccount;

/// What to do when the treasury cannot fund a top-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortfallPolicy {
    /// Log a warning and leave the balance as it is.
    #[default]
    Skip,
    /// Fail the step.
    Fail,
}

/// Unknown shortfall policy name.
#[derive(Debug, Error)]
#[error("Unknown shortfall policy '{0}' (expected 'skip' or 'fail')")]
pub struct UnknownShortfallPolicy(String);

impl FromStr for ShortfallPolicy {
    type Err = UnknownShortfallPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(UnknownShortfallPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ShortfallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Fail => f.write_str("fail"),
        }
    }
}

/// Errors raised while reconciling a balance.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A balance query failed.
    #[error("Balance query failed: {0}")]
    QueryFailed(#[source] LedgerError),

    /// The association transaction failed.
    #[error("Association of {token_id} with {account_id} failed: {source}")]
    AssociationFailed {
        /// Token being associated.
        token_id: TokenId,
        /// Account being associated.
        account_id: AccountId,
        /// Cause.
        #[source]
        source: LedgerError,
    },

    /// The top-up transfer failed.
    #[error("Top-up of {account_id} failed: {source}")]
    TransferFailed {
        /// Account being topped up.
        account_id: AccountId,
        /// Cause.
        #[source]
        source: LedgerError,
    },

    /// Top-up amount does not fit a signed transfer leg.
    #[error("Top-up amount {0} out of range")]
    AmountOutOfRange(u64),

    /// The treasury cannot fund the top-up and the policy is [`ShortfallPolicy::Fail`].
    #[error("Treasury holds {available} of {token_id}, {required} required")]
    InsufficientTreasury {
        /// Token being topped up.
        token_id: TokenId,
        /// Treasury balance.
        available: u64,
        /// Amount the treasury must hold.
        required: u64,
    },
}

/// Balance observed after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedBalance {
    /// Reconciled account.
    pub account_id: AccountId,
    /// Token balance after reconciliation.
    pub amount: u64,
    /// Amount moved from the treasury.
    pub transferred: u64,
    /// Whether an association transaction was submitted.
    pub associated: bool,
}

/// Brings token balances up to the amounts scenarios describe.
///
/// Fees are paid by the client's operator. Association is signed by the
/// target, top-ups by the treasury.
pub struct Reconciler<'a> {
    client: &'a Client,
    policy: ShortfallPolicy,
}

impl<'a> Reconciler<'a> {
    /// Reconciler submitting through `client`.
    pub fn new(client: &'a Client, policy: ShortfallPolicy) -> Self {
        Self { client, policy }
    }

    /// Ensure `target` holds at least `desired` units of `token_id`.
    pub async fn reconcile(
        &self,
        token_id: TokenId,
        treasury: &TestAccount,
        target: &TestAccount,
        desired: u64,
    ) -> Result<ObservedBalance, ReconcileError> {
        let before = self
            .client
            .account_balance(&target.id)
            .await
            .map_err(ReconcileError::QueryFailed)?;
        let treasury_balance = self
            .client
            .account_balance(&treasury.id)
            .await
            .map_err(ReconcileError::QueryFailed)?
            .token_balance(&token_id);

        let mut observed = ObservedBalance {
            account_id: target.id,
            amount: before.token_balance(&token_id),
            transferred: 0,
            associated: false,
        };

        if target.id != treasury.id && !before.is_associated(&token_id) {
            self.associate(token_id, target).await?;
            observed.associated = true;
        }

        if desired <= observed.amount {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "{} already holds {} of {} (wanted {})",
                    target.id,
                    observed.amount,
                    token_id,
                    desired
                );
            }
            return Ok(observed);
        }

        if target.id == treasury.id || treasury_balance < desired {
            return match self.policy {
                ShortfallPolicy::Skip => {
                    if log::log_enabled!(log::Level::Warn) {
                        log::warn!(
                            "Treasury {} holds {} of {}, cannot bring {} from {} to {}",
                            treasury.id,
                            treasury_balance,
                            token_id,
                            target.id,
                            observed.amount,
                            desired
                        );
                    }
                    Ok(observed)
                }
                ShortfallPolicy::Fail => Err(ReconcileError::InsufficientTreasury {
                    token_id,
                    available: treasury_balance,
                    required: desired,
                }),
            };
        }

        let delta = desired - observed.amount;
        self.top_up(token_id, treasury, target, delta).await?;

        let after = self
            .client
            .account_balance(&target.id)
            .await
            .map_err(ReconcileError::QueryFailed)?;
        observed.amount = after.token_balance(&token_id);
        observed.transferred = delta;
        Ok(observed)
    }

    async fn associate(
        &self,
        token_id: TokenId,
        target: &TestAccount,
    ) -> Result<(), ReconcileError> {
        let failed = |source| ReconcileError::AssociationFailed {
            token_id,
            account_id: target.id,
            source,
        };

        let mut transaction = Transaction::new(TransactionBody::TokenAssociate {
            account_id: target.id,
            token_ids: vec![token_id],
        });
        self.client.freeze(&mut transaction).map_err(failed)?;
        transaction.sign(&target.key).map_err(failed)?;

        match self.client.execute_and_confirm(transaction).await {
            Ok(_) => {
                if log::log_enabled!(log::Level::Info) {
                    log::info!("Associated {} with {}", token_id, target.id);
                }
                Ok(())
            }
            Err(err) if err.status() == Some(Status::TokenAlreadyAssociatedToAccount) => Ok(()),
            Err(err) => Err(failed(err)),
        }
    }

    async fn top_up(
        &self,
        token_id: TokenId,
        treasury: &TestAccount,
        target: &TestAccount,
        delta: u64,
    ) -> Result<(), ReconcileError> {
        let failed = |source| ReconcileError::TransferFailed {
            account_id: target.id,
            source,
        };
        let amount =
            i64::try_from(delta).map_err(|_| ReconcileError::AmountOutOfRange(delta))?;

        let mut transaction = Transaction::token_transfer(vec![
            TokenTransfer {
                token_id,
                account_id: treasury.id,
                amount: -amount,
            },
            TokenTransfer {
                token_id,
                account_id: target.id,
                amount,
            },
        ]);
        self.client.freeze(&mut transaction).map_err(failed)?;
        transaction.sign(&treasury.key).map_err(failed)?;
        self.client
            .execute_and_confirm(transaction)
            .await
            .map_err(failed)?;

        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Transferred {} of {} from treasury {} to {}",
                delta,
                token_id,
                treasury.id,
                target.id
            );
        }
        Ok(())
    }
}
