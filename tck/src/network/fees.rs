use ledger_common::{Hbar, TransactionBody};
use serde::{Deserialize, Serialize};

/// Flat per-operation fees charged to the payer, in tinybars.
///
/// The amounts only need to be non-zero and small relative to test
/// balances; they are not meant to mirror any real fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Token creation.
    pub token_create: i64,
    /// Token mint.
    pub token_mint: i64,
    /// Token association.
    pub token_associate: i64,
    /// Token transfer.
    pub token_transfer: i64,
    /// Topic creation.
    pub topic_create: i64,
    /// Topic message submission.
    pub topic_message_submit: i64,
}

impl FeeSchedule {
    /// A schedule charging nothing.
    pub const fn free() -> Self {
        Self {
            token_create: 0,
            token_mint: 0,
            token_associate: 0,
            token_transfer: 0,
            topic_create: 0,
            topic_message_submit: 0,
        }
    }

    /// Fee charged for `body`.
    pub fn fee_for(&self, body: &TransactionBody) -> Hbar {
        let tinybars = match body {
            TransactionBody::TokenCreate(_) => self.token_create,
            TransactionBody::TokenMint { .. } => self.token_mint,
            TransactionBody::TokenAssociate { .. } => self.token_associate,
            TransactionBody::TokenTransfer { .. } => self.token_transfer,
            TransactionBody::TopicCreate { .. } => self.topic_create,
            TransactionBody::TopicMessageSubmit { .. } => self.topic_message_submit,
        };
        Hbar::from_tinybars(tinybars)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            token_create: 100_000_000,
            token_mint: 1_000_000,
            token_associate: 5_000_000,
            token_transfer: 100_000,
            topic_create: 1_000_000,
            topic_message_submit: 10_000,
        }
    }
}
