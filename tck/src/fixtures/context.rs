//! Per-scenario state threaded between steps.
//!
//! A [`ScenarioContext`] is created empty when a scenario starts and dropped
//! when it ends. Test accounts are materialised from the configuration the
//! first time a step refers to them and never change afterwards; identifiers
//! produced by creation steps are set once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ledger_common::{KeyList, TokenId, TopicId, Transaction, TransactionId};
use thiserror::Error;

use super::accounts::{TestAccount, TREASURY_INDEX};
use super::transfer::MultiPartyTransfer;
use crate::config::SuiteConfig;

/// Errors raised by context lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A value was read before any step produced it.
    #[error("No {0} in scenario context")]
    Missing(&'static str),

    /// A set-once value was produced twice.
    #[error("{0} already set in scenario context")]
    AlreadySet(&'static str),

    /// The configuration has no account at this index.
    #[error("Account #{index} is not configured ({configured} account(s) available)")]
    UnknownAccount {
        /// Requested index.
        index: usize,
        /// Number of configured accounts.
        configured: usize,
    },
}

/// A transfer created by one step and submitted by a later one.
#[derive(Debug, Clone)]
pub enum PendingTransfer {
    /// Unfrozen transfer plus the indexes of the accounts that must sign it.
    Single {
        /// The transfer, not yet frozen.
        transaction: Transaction,
        /// Debited accounts.
        signers: Vec<usize>,
    },
    /// Several debits and credits settled together.
    MultiParty(MultiPartyTransfer),
}

/// Typed scenario-scoped store.
#[derive(Debug)]
pub struct ScenarioContext {
    config: Arc<SuiteConfig>,
    accounts: BTreeMap<usize, TestAccount>,
    token_id: Option<TokenId>,
    topic_id: Option<TopicId>,
    threshold_key: Option<KeyList>,
    last_transaction_id: Option<TransactionId>,
    pending: Option<PendingTransfer>,
    transfer_submitted: bool,
    funded: BTreeSet<usize>,
}

impl ScenarioContext {
    /// Empty context drawing accounts from `config`.
    pub fn new(config: Arc<SuiteConfig>) -> Self {
        Self {
            config,
            accounts: BTreeMap::new(),
            token_id: None,
            topic_id: None,
            threshold_key: None,
            last_transaction_id: None,
            pending: None,
            transfer_submitted: false,
            funded: BTreeSet::new(),
        }
    }

    /// Account at `index`, created from configuration on first use.
    pub fn account(&mut self, index: usize) -> Result<TestAccount, ContextError> {
        if let Some(account) = self.accounts.get(&index) {
            return Ok(account.clone());
        }
        let configured = self
            .config
            .account(index)
            .ok_or(ContextError::UnknownAccount {
                index,
                configured: self.config.accounts.len(),
            })?;
        let account = TestAccount {
            index,
            id: configured.id,
            key: configured.private_key.clone(),
        };
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Account #{} is {}", index, account.id);
        }
        self.accounts.insert(index, account.clone());
        Ok(account)
    }

    /// The treasury account.
    pub fn treasury(&mut self) -> Result<TestAccount, ContextError> {
        self.account(TREASURY_INDEX)
    }

    /// Accounts referenced so far, by index.
    pub fn known_accounts(&self) -> impl Iterator<Item = &TestAccount> {
        self.accounts.values()
    }

    /// Token created in this scenario.
    pub fn token_id(&self) -> Result<TokenId, ContextError> {
        self.token_id.ok_or(ContextError::Missing("tokenId"))
    }

    /// Record the token created in this scenario.
    pub fn set_token_id(&mut self, token_id: TokenId) -> Result<(), ContextError> {
        if self.token_id.is_some() {
            return Err(ContextError::AlreadySet("tokenId"));
        }
        self.token_id = Some(token_id);
        Ok(())
    }

    /// Topic created in this scenario.
    pub fn topic_id(&self) -> Result<TopicId, ContextError> {
        self.topic_id.ok_or(ContextError::Missing("topicId"))
    }

    /// Record the topic created in this scenario.
    pub fn set_topic_id(&mut self, topic_id: TopicId) -> Result<(), ContextError> {
        if self.topic_id.is_some() {
            return Err(ContextError::AlreadySet("topicId"));
        }
        self.topic_id = Some(topic_id);
        Ok(())
    }

    /// Threshold key built in this scenario.
    pub fn threshold_key(&self) -> Result<&KeyList, ContextError> {
        self.threshold_key
            .as_ref()
            .ok_or(ContextError::Missing("thresholdKey"))
    }

    /// Record the threshold key.
    pub fn set_threshold_key(&mut self, key: KeyList) {
        self.threshold_key = Some(key);
    }

    /// Last transaction submitted by a step.
    pub fn last_transaction_id(&self) -> Result<TransactionId, ContextError> {
        self.last_transaction_id
            .ok_or(ContextError::Missing("transactionId"))
    }

    /// Remember the last transaction submitted by a step.
    pub fn set_last_transaction_id(&mut self, transaction_id: TransactionId) {
        self.last_transaction_id = Some(transaction_id);
    }

    /// Store a transfer for a later submit step, replacing any earlier one.
    pub fn set_pending(&mut self, pending: PendingTransfer) {
        self.pending = Some(pending);
    }

    /// Take the pending transfer.
    pub fn take_pending(&mut self) -> Result<PendingTransfer, ContextError> {
        self.pending
            .take()
            .ok_or(ContextError::Missing("pending transaction"))
    }

    /// Whether a step has submitted a token transfer in this scenario.
    pub fn transfer_submitted(&self) -> bool {
        self.transfer_submitted
    }

    /// Note that a token transfer was submitted.
    pub fn mark_transfer_submitted(&mut self) {
        self.transfer_submitted = true;
    }

    /// Whether the account at `index` was funded by a step already.
    pub fn is_funded(&self, index: usize) -> bool {
        self.funded.contains(&index)
    }

    /// Note that the account at `index` was funded.
    pub fn mark_funded(&mut self, index: usize) {
        self.funded.insert(index);
    }
}
