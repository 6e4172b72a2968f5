use std::sync::Arc;

use async_trait::async_trait;
use ledger_common::crypto::Key;
use ledger_common::{
    AccountBalance, AccountId, Hbar, LedgerError, LedgerNetwork, Status, TokenId, TokenInfo,
    TopicId, TopicInfo, TopicMessage, Transaction, TransactionId, TransactionReceipt,
    TransactionRecord, TransactionResponse,
};
use parking_lot::RwLock;
use tokio::time::Duration;

use super::fees::FeeSchedule;
use super::state::LedgerState;
use super::ProcessedTransaction;
use crate::config::SuiteConfig;
use crate::orchestrator::{Clock, SystemClock};

/// Default delay between consensus and visibility on the mirror feed.
pub const DEFAULT_MIRROR_LAG: Duration = Duration::from_millis(1500);

/// In-process ledger network.
///
/// Transactions reach consensus the moment they are submitted; receipts and
/// records are available immediately afterwards. Topic messages only show
/// up on the mirror feed once the configured lag has elapsed on the clock.
pub struct SimulatedNetwork {
    name: String,
    state: RwLock<LedgerState>,
    clock: Arc<dyn Clock>,
    mirror_lag: Duration,
    fees: FeeSchedule,
}

impl SimulatedNetwork {
    /// Builder with default settings and no accounts.
    pub fn builder() -> SimulatedNetworkBuilder {
        SimulatedNetworkBuilder::new()
    }

    /// Number of transactions that passed precheck.
    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    /// Number of processed transactions matching `predicate`.
    pub fn count_history<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ProcessedTransaction) -> bool,
    {
        self.state
            .read()
            .history
            .iter()
            .filter(|processed| predicate(processed))
            .count()
    }

    /// Mirror feed propagation lag.
    pub fn mirror_lag(&self) -> Duration {
        self.mirror_lag
    }

    /// Fee schedule in force.
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    fn process(&self, transaction: Transaction) -> Result<TransactionResponse, LedgerError> {
        let transaction_id = transaction.transaction_id().ok_or(LedgerError::NotFrozen)?;
        let precheck = |status: Status| LedgerError::Precheck {
            transaction_id,
            status,
        };
        let signers = transaction.verified_signers()?;
        let transaction_hash = transaction.hash()?;
        let fee = self.fees.fee_for(transaction.body());
        let payer = transaction_id.account_id;

        let mut state = self.state.write();
        if state.records.contains_key(&transaction_id) {
            return Err(precheck(Status::DuplicateTransaction));
        }
        let payer_key = state
            .accounts
            .get(&payer)
            .map(|account| account.key.clone())
            .ok_or_else(|| precheck(Status::InvalidAccountId))?;
        if !payer_key.is_satisfied_by(&signers) {
            return Err(precheck(Status::InvalidSignature));
        }
        state.charge_fee(&payer, fee).map_err(precheck)?;

        let consensus_timestamp_nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let visible_at = self.clock.now() + self.mirror_lag;
        let receipt = state
            .apply(
                transaction_id,
                transaction.body(),
                &signers,
                consensus_timestamp_nanos,
                visible_at,
            )
            .unwrap_or_else(|status| TransactionReceipt::with_status(transaction_id, status));

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "[{}] {} {} -> {} (fee {})",
                self.name,
                transaction.body().name(),
                transaction_id,
                receipt.status,
                fee
            );
        }

        let record = TransactionRecord {
            receipt,
            payer,
            transaction_fee: fee,
            transaction_hash,
            memo: transaction.memo().to_string(),
        };
        state.records.insert(transaction_id, record.clone());
        state.history.push(ProcessedTransaction {
            transaction,
            record,
        });
        Ok(TransactionResponse { transaction_id })
    }
}

#[async_trait]
impl LedgerNetwork for SimulatedNetwork {
    async fn submit(&self, transaction: Transaction) -> Result<TransactionResponse, LedgerError> {
        self.process(transaction)
    }

    async fn receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.record(transaction_id).await.map(|record| record.receipt)
    }

    async fn record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, LedgerError> {
        self.state
            .read()
            .records
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LedgerError::QueryStatus {
                status: Status::ReceiptNotFound,
                message: format!("record of {}", transaction_id),
            })
    }

    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance, LedgerError> {
        self.state
            .read()
            .balance(account_id)
            .ok_or_else(|| LedgerError::QueryStatus {
                status: Status::InvalidAccountId,
                message: format!("balance of {}", account_id),
            })
    }

    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo, LedgerError> {
        self.state
            .read()
            .tokens
            .get(token_id)
            .cloned()
            .ok_or_else(|| LedgerError::QueryStatus {
                status: Status::InvalidTokenId,
                message: format!("token info of {}", token_id),
            })
    }

    async fn topic_info(&self, topic_id: &TopicId) -> Result<TopicInfo, LedgerError> {
        self.state
            .read()
            .topics
            .get(topic_id)
            .map(|topic| topic.info.clone())
            .ok_or_else(|| LedgerError::QueryStatus {
                status: Status::InvalidTopicId,
                message: format!("topic info of {}", topic_id),
            })
    }

    async fn topic_messages(
        &self,
        topic_id: &TopicId,
        after_sequence: u64,
    ) -> Result<Vec<TopicMessage>, LedgerError> {
        let now = self.clock.now();
        let state = self.state.read();
        let topic = state
            .topics
            .get(topic_id)
            .ok_or_else(|| LedgerError::QueryStatus {
                status: Status::InvalidTopicId,
                message: format!("messages of {}", topic_id),
            })?;
        Ok(topic
            .messages
            .iter()
            .filter(|(message, visible_at)| {
                message.sequence_number > after_sequence && *visible_at <= now
            })
            .map(|(message, _)| message.clone())
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`SimulatedNetwork`].
pub struct SimulatedNetworkBuilder {
    name: String,
    clock: Option<Arc<dyn Clock>>,
    mirror_lag: Duration,
    fees: FeeSchedule,
    accounts: Vec<(AccountId, Key, Hbar)>,
}

impl SimulatedNetworkBuilder {
    /// Builder with default settings and no accounts.
    pub fn new() -> Self {
        Self {
            name: "simulated".to_string(),
            clock: None,
            mirror_lag: DEFAULT_MIRROR_LAG,
            fees: FeeSchedule::default(),
            accounts: Vec::new(),
        }
    }

    /// Builder pre-loaded with the accounts and timings of `config`.
    pub fn from_config(config: &SuiteConfig) -> Self {
        let mut builder = Self::new()
            .with_name(config.network.clone())
            .with_mirror_lag(config.mirror_lag())
            .with_fees(config.fees);
        for account in &config.accounts {
            builder = builder.with_account(
                account.id,
                account.private_key.public_key(),
                Hbar::new(account.hbar),
            );
        }
        builder
    }

    /// Network name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Clock measuring mirror lag. Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Delay before submitted messages appear on the mirror feed.
    pub fn with_mirror_lag(mut self, lag: Duration) -> Self {
        self.mirror_lag = lag;
        self
    }

    /// Fee schedule.
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Genesis account.
    pub fn with_account(mut self, id: AccountId, key: impl Into<Key>, hbars: Hbar) -> Self {
        self.accounts.push((id, key.into(), hbars));
        self
    }

    /// Build the network.
    pub fn build(self) -> SimulatedNetwork {
        let mut state = LedgerState::new();
        for (id, key, hbars) in self.accounts {
            state.add_account(id, key, hbars);
        }
        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Simulated network '{}' started with {} account(s), mirror lag {:?}",
                self.name,
                state.accounts.len(),
                self.mirror_lag
            );
        }
        SimulatedNetwork {
            name: self.name,
            state: RwLock::new(state),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            mirror_lag: self.mirror_lag,
            fees: self.fees,
        }
    }
}

impl Default for SimulatedNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
