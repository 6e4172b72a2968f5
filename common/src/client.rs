//! Client bound to a network and an operator account.

use std::fmt;
use std::sync::Arc;

use crate::crypto::PrivateKey;
use crate::error::LedgerError;
use crate::id::{AccountId, TokenId, TopicId, TransactionId};
use crate::network::LedgerNetwork;
use crate::query::{AccountBalance, TokenInfo, TopicInfo, TopicMessage};
use crate::receipt::{TransactionReceipt, TransactionRecord, TransactionResponse};
use crate::transaction::Transaction;

/// Account paying for transactions executed through a [`Client`].
#[derive(Clone, Debug)]
pub struct Operator {
    /// Paying account.
    pub account_id: AccountId,
    /// Key of the paying account.
    pub key: PrivateKey,
}

/// Entry point for submitting transactions and running queries.
#[derive(Clone)]
pub struct Client {
    network: Arc<dyn LedgerNetwork>,
    operator: Option<Operator>,
}

impl Client {
    /// Client without an operator.
    pub fn new(network: Arc<dyn LedgerNetwork>) -> Self {
        Self {
            network,
            operator: None,
        }
    }

    /// Client with `account_id` paying and signing.
    pub fn with_operator(mut self, account_id: AccountId, key: PrivateKey) -> Self {
        self.set_operator(account_id, key);
        self
    }

    /// Replace the operator.
    pub fn set_operator(&mut self, account_id: AccountId, key: PrivateKey) {
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Operator set to {}", account_id);
        }
        self.operator = Some(Operator { account_id, key });
    }

    /// Current operator.
    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    /// Account id of the current operator.
    pub fn operator_account_id(&self) -> Result<AccountId, LedgerError> {
        self.operator
            .as_ref()
            .map(|op| op.account_id)
            .ok_or(LedgerError::NoOperator)
    }

    /// Underlying network.
    pub fn network(&self) -> &Arc<dyn LedgerNetwork> {
        &self.network
    }

    /// Freeze `transaction` with the operator as payer.
    pub fn freeze(&self, transaction: &mut Transaction) -> Result<(), LedgerError> {
        if !transaction.is_frozen() {
            transaction.freeze_with(self.operator_account_id()?);
        }
        Ok(())
    }

    /// Submit `transaction` without waiting for consensus.
    ///
    /// Unfrozen transactions are frozen with the operator as payer. The
    /// operator signs whenever it is the payer.
    pub async fn execute(
        &self,
        mut transaction: Transaction,
    ) -> Result<TransactionResponse, LedgerError> {
        self.freeze(&mut transaction)?;
        if let Some(operator) = &self.operator {
            if transaction.payer() == Some(operator.account_id) {
                transaction.sign(&operator.key)?;
            }
        }
        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Submitting {} {} (memo: {:?}, {} signature(s))",
                transaction.body().name(),
                transaction
                    .transaction_id()
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                transaction.memo(),
                transaction.signatures().len()
            );
        }
        self.network.submit(transaction).await
    }

    /// Submit `transaction` and wait for a successful receipt.
    pub async fn execute_and_confirm(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionReceipt, LedgerError> {
        let response = self.execute(transaction).await?;
        self.receipt(&response.transaction_id).await
    }

    /// Receipt of `transaction_id`; a non-success status is an error.
    pub async fn receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let receipt = self.network.receipt(transaction_id).await?;
        if !receipt.status.is_success() {
            return Err(LedgerError::ReceiptStatus {
                transaction_id: *transaction_id,
                status: receipt.status,
            });
        }
        Ok(receipt)
    }

    /// Record of `transaction_id`.
    pub async fn record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, LedgerError> {
        self.network.record(transaction_id).await
    }

    /// Balances of `account_id`.
    pub async fn account_balance(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountBalance, LedgerError> {
        self.network.account_balance(account_id).await
    }

    /// Metadata of `token_id`.
    pub async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo, LedgerError> {
        self.network.token_info(token_id).await
    }

    /// Metadata of `topic_id`.
    pub async fn topic_info(&self, topic_id: &TopicId) -> Result<TopicInfo, LedgerError> {
        self.network.topic_info(topic_id).await
    }

    /// Mirror feed messages after `after_sequence`.
    pub async fn topic_messages(
        &self,
        topic_id: &TopicId,
        after_sequence: u64,
    ) -> Result<Vec<TopicMessage>, LedgerError> {
        self.network.topic_messages(topic_id, after_sequence).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("network", &self.network.name())
            .field("operator", &self.operator.as_ref().map(|op| op.account_id))
            .finish()
    }
}
