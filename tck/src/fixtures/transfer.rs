//! Multi-party token transfers.
//!
//! A [`MultiPartyTransfer`] collects debit and credit legs for one token and
//! settles them either as a single atomic transaction or as independent
//! per-debitor transactions.

use std::fmt;
use std::str::FromStr;

use ledger_common::{
    AccountId, Client, LedgerError, TokenId, TokenTransfer, Transaction, TransactionId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::accounts::TestAccount;

/// How a multi-party transfer reaches the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    /// One transaction carrying every leg; all debitors sign it.
    #[default]
    Atomic,
    /// One transaction per debitor, skipped when the debitor cannot cover it.
    Independent,
}

/// Unknown settlement mode name.
#[derive(Debug, Error)]
#[error("Unknown settlement mode '{0}' (expected 'atomic' or 'independent')")]
pub struct UnknownSettlementMode(String);

impl FromStr for SettlementMode {
    type Err = UnknownSettlementMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "independent" => Ok(Self::Independent),
            other => Err(UnknownSettlementMode(other.to_string())),
        }
    }
}

impl fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => f.write_str("atomic"),
            Self::Independent => f.write_str("independent"),
        }
    }
}

/// Errors raised while settling a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Debits and credits differ.
    #[error("Transfer is unbalanced: {debits} debited, {credits} credited")]
    Unbalanced {
        /// Total debited.
        debits: u64,
        /// Total credited.
        credits: u64,
    },

    /// No legs at all.
    #[error("Transfer has no legs")]
    Empty,

    /// Amount does not fit a signed transfer leg.
    #[error("Transfer amount {0} out of range")]
    AmountOutOfRange(u64),

    /// A balance query failed.
    #[error("Balance query failed: {0}")]
    Query(#[source] LedgerError),

    /// Submission or consensus failed.
    #[error("Transfer submission failed: {0}")]
    Submission(#[source] LedgerError),
}

/// One side of a transfer.
#[derive(Debug, Clone)]
pub struct TransferLeg {
    /// Account debited or credited.
    pub account: TestAccount,
    /// Positive amount.
    pub amount: u64,
}

/// A debit leg left out of an independent settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLeg {
    /// Debitor.
    pub account_id: AccountId,
    /// Balance at the time of the check.
    pub balance: u64,
    /// Amount that would have been debited.
    pub amount: u64,
}

/// Result of a settlement.
#[derive(Debug, Clone, Default)]
pub struct TransferOutcome {
    /// Transactions that reached consensus successfully.
    pub transactions: Vec<TransactionId>,
    /// Debit legs that were not submitted.
    pub skipped: Vec<SkippedLeg>,
}

impl TransferOutcome {
    /// Whether every leg settled.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Debits and credits of one token between several accounts.
#[derive(Debug, Clone)]
pub struct MultiPartyTransfer {
    token_id: TokenId,
    debits: Vec<TransferLeg>,
    credits: Vec<TransferLeg>,
    payer: Option<TestAccount>,
}

impl MultiPartyTransfer {
    /// Empty transfer of `token_id`.
    pub fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            debits: Vec::new(),
            credits: Vec::new(),
            payer: None,
        }
    }

    /// Take `amount` out of `account`.
    pub fn debit(mut self, account: TestAccount, amount: u64) -> Self {
        self.debits.push(TransferLeg { account, amount });
        self
    }

    /// Put `amount` into `account`.
    pub fn credit(mut self, account: TestAccount, amount: u64) -> Self {
        self.credits.push(TransferLeg { account, amount });
        self
    }

    /// Account paying the fees. Defaults to the client operator.
    pub fn paid_by(mut self, account: TestAccount) -> Self {
        self.payer = Some(account);
        self
    }

    /// Token moved.
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    /// Debit legs in insertion order.
    pub fn debits(&self) -> &[TransferLeg] {
        &self.debits
    }

    /// Credit legs in insertion order.
    pub fn credits(&self) -> &[TransferLeg] {
        &self.credits
    }

    /// Check the legs balance.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.debits.is_empty() && self.credits.is_empty() {
            return Err(TransferError::Empty);
        }
        let debits = total(&self.debits)?;
        let credits = total(&self.credits)?;
        if debits != credits {
            return Err(TransferError::Unbalanced { debits, credits });
        }
        Ok(())
    }

    /// Submit through `client` and wait for consensus.
    pub async fn settle(
        &self,
        client: &Client,
        mode: SettlementMode,
    ) -> Result<TransferOutcome, TransferError> {
        self.validate()?;
        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Settling {} transfer of {} ({} debit(s), {} credit(s))",
                mode,
                self.token_id,
                self.debits.len(),
                self.credits.len()
            );
        }
        match mode {
            SettlementMode::Atomic => self.settle_atomic(client).await,
            SettlementMode::Independent => self.settle_independent(client).await,
        }
    }

    async fn settle_atomic(&self, client: &Client) -> Result<TransferOutcome, TransferError> {
        let mut transfers = Vec::with_capacity(self.debits.len() + self.credits.len());
        for leg in &self.debits {
            transfers.push(self.leg(&leg.account, leg.amount, true)?);
        }
        for leg in &self.credits {
            transfers.push(self.leg(&leg.account, leg.amount, false)?);
        }
        let signers: Vec<&TestAccount> = self.debits.iter().map(|leg| &leg.account).collect();
        let transaction_id = self.submit(client, transfers, &signers).await?;

        Ok(TransferOutcome {
            transactions: vec![transaction_id],
            skipped: Vec::new(),
        })
    }

    async fn settle_independent(&self, client: &Client) -> Result<TransferOutcome, TransferError> {
        let mut outcome = TransferOutcome::default();

        for (debit, allocations) in self.allocate() {
            let balance = client
                .account_balance(&debit.account.id)
                .await
                .map_err(TransferError::Query)?
                .token_balance(&self.token_id);
            if balance <= debit.amount {
                if log::log_enabled!(log::Level::Warn) {
                    log::warn!(
                        "Skipping debit of {} from {}: balance is {}",
                        debit.amount,
                        debit.account.id,
                        balance
                    );
                }
                outcome.skipped.push(SkippedLeg {
                    account_id: debit.account.id,
                    balance,
                    amount: debit.amount,
                });
                continue;
            }

            let mut transfers = vec![self.leg(&debit.account, debit.amount, true)?];
            for (account, amount) in allocations {
                transfers.push(self.leg(account, amount, false)?);
            }
            let transaction_id = self.submit(client, transfers, &[&debit.account]).await?;
            outcome.transactions.push(transaction_id);
        }
        Ok(outcome)
    }

    /// Split credits across debits in order, filling each debit before
    /// moving on to the next.
    fn allocate(&self) -> Vec<(&TransferLeg, Vec<(&TestAccount, u64)>)> {
        let mut remaining: Vec<u64> = self.credits.iter().map(|leg| leg.amount).collect();
        let mut cursor = 0;

        self.debits
            .iter()
            .map(|debit| {
                let mut needed = debit.amount;
                let mut allocations = Vec::new();
                while needed > 0 && cursor < remaining.len() {
                    let take = needed.min(remaining[cursor]);
                    if take > 0 {
                        allocations.push((&self.credits[cursor].account, take));
                        needed -= take;
                        remaining[cursor] -= take;
                    }
                    if remaining[cursor] == 0 {
                        cursor += 1;
                    }
                }
                (debit, allocations)
            })
            .collect()
    }

    fn leg(
        &self,
        account: &TestAccount,
        amount: u64,
        debit: bool,
    ) -> Result<TokenTransfer, TransferError> {
        let amount = i64::try_from(amount).map_err(|_| TransferError::AmountOutOfRange(amount))?;
        Ok(TokenTransfer {
            token_id: self.token_id,
            account_id: account.id,
            amount: if debit { -amount } else { amount },
        })
    }

    async fn submit(
        &self,
        client: &Client,
        transfers: Vec<TokenTransfer>,
        signers: &[&TestAccount],
    ) -> Result<TransactionId, TransferError> {
        let mut transaction = Transaction::token_transfer(transfers);
        match &self.payer {
            Some(payer) => {
                transaction.freeze_with(payer.id);
                transaction
                    .sign(&payer.key)
                    .map_err(TransferError::Submission)?;
            }
            None => client
                .freeze(&mut transaction)
                .map_err(TransferError::Submission)?,
        }
        for signer in signers {
            transaction
                .sign(&signer.key)
                .map_err(TransferError::Submission)?;
        }
        let receipt = client
            .execute_and_confirm(transaction)
            .await
            .map_err(TransferError::Submission)?;
        Ok(receipt.transaction_id)
    }
}

/// Sum of leg amounts, failing on the leg that overflows.
fn total(legs: &[TransferLeg]) -> Result<u64, TransferError> {
    legs.iter().try_fold(0u64, |sum, leg| {
        sum.checked_add(leg.amount)
            .ok_or(TransferError::AmountOutOfRange(leg.amount))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_common::PrivateKey;

    fn account(index: usize) -> TestAccount {
        TestAccount {
            index,
            id: AccountId::new(1001 + index as u64),
            key: PrivateKey::generate(),
        }
    }

    #[test]
    fn test_validate() {
        let empty = MultiPartyTransfer::new(TokenId::new(1));
        assert!(matches!(empty.validate(), Err(TransferError::Empty)));

        let unbalanced = MultiPartyTransfer::new(TokenId::new(1))
            .debit(account(1), 10)
            .credit(account(2), 9);
        assert!(matches!(
            unbalanced.validate(),
            Err(TransferError::Unbalanced {
                debits: 10,
                credits: 9
            })
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_totals() {
        let transfer = MultiPartyTransfer::new(TokenId::new(1))
            .debit(account(1), u64::MAX)
            .debit(account(2), u64::MAX)
            .credit(account(3), 1)
            .credit(account(4), 1);
        assert!(matches!(
            transfer.validate(),
            Err(TransferError::AmountOutOfRange(u64::MAX))
        ));

        let credits = MultiPartyTransfer::new(TokenId::new(1))
            .debit(account(1), 2)
            .credit(account(3), u64::MAX)
            .credit(account(4), 3);
        assert!(matches!(
            credits.validate(),
            Err(TransferError::AmountOutOfRange(3))
        ));
    }

    #[test]
    fn test_allocate_fills_debits_in_order() {
        let (first, second, third, fourth) = (account(1), account(2), account(3), account(4));
        let transfer = MultiPartyTransfer::new(TokenId::new(1))
            .debit(first.clone(), 10)
            .debit(second.clone(), 10)
            .credit(third.clone(), 5)
            .credit(fourth.clone(), 15);

        let allocations = transfer.allocate();
        assert_eq!(allocations.len(), 2);

        let (debit, legs) = &allocations[0];
        assert_eq!(debit.account.id, first.id);
        let legs: Vec<_> = legs.iter().map(|(a, n)| (a.id, *n)).collect();
        assert_eq!(legs, vec![(third.id, 5), (fourth.id, 5)]);

        let (debit, legs) = &allocations[1];
        assert_eq!(debit.account.id, second.id);
        let legs: Vec<_> = legs.iter().map(|(a, n)| (a.id, *n)).collect();
        assert_eq!(legs, vec![(fourth.id, 10)]);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "Independent".parse::<SettlementMode>().unwrap(),
            SettlementMode::Independent
        );
        assert!("eventual".parse::<SettlementMode>().is_err());
        assert_eq!(SettlementMode::default(), SettlementMode::Atomic);
    }
}
