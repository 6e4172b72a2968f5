//! The capability a ledger network offers to clients.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::id::{AccountId, TokenId, TopicId, TransactionId};
use crate::query::{AccountBalance, TokenInfo, TopicInfo, TopicMessage};
use crate::receipt::{TransactionReceipt, TransactionRecord, TransactionResponse};
use crate::transaction::Transaction;

/// Capabilities of a ledger network as seen by a client.
///
/// Submission returns as soon as a node accepts the transaction; finality is
/// observed through [`LedgerNetwork::receipt`]. Topic messages are served by
/// a mirror feed and may become visible some time after consensus.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Submit a frozen, signed transaction.
    async fn submit(&self, transaction: Transaction) -> Result<TransactionResponse, LedgerError>;

    /// Receipt of a submitted transaction, whatever its status.
    async fn receipt(&self, transaction_id: &TransactionId)
        -> Result<TransactionReceipt, LedgerError>;

    /// Record of a submitted transaction.
    async fn record(&self, transaction_id: &TransactionId)
        -> Result<TransactionRecord, LedgerError>;

    /// Hbar and token balances of an account.
    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance, LedgerError>;

    /// Token metadata.
    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo, LedgerError>;

    /// Topic metadata.
    async fn topic_info(&self, topic_id: &TopicId) -> Result<TopicInfo, LedgerError>;

    /// Messages visible on the mirror feed with a sequence number greater
    /// than `after_sequence`, in order.
    async fn topic_messages(
        &self,
        topic_id: &TopicId,
        after_sequence: u64,
    ) -> Result<Vec<TopicMessage>, LedgerError>;

    /// Human readable network name.
    fn name(&self) -> &str;
}
