//! Ledger state of the simulated network and the rules applying
//! transactions to it.
//!
//! Every operation validates completely before mutating anything, so a
//! failed transaction leaves balances, supply and topics untouched apart
//! from the fee already charged to the payer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ledger_common::crypto::{Key, PublicKey};
use ledger_common::transaction::{TokenCreate, TokenTransfer};
use ledger_common::{
    AccountBalance, AccountId, Hbar, Status, TokenId, TokenInfo, TopicId, TopicInfo, TopicMessage,
    TransactionBody, TransactionId, TransactionReceipt, TransactionRecord,
};
use tokio::time::Instant;

use super::ProcessedTransaction;

/// Largest accepted decimals value.
pub const MAX_TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone)]
pub(crate) struct AccountState {
    pub key: Key,
    pub hbars: Hbar,
    pub tokens: BTreeMap<TokenId, u64>,
}

#[derive(Debug, Clone)]
pub(crate) struct TopicState {
    pub info: TopicInfo,
    pub messages: Vec<(TopicMessage, Instant)>,
}

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub accounts: BTreeMap<AccountId, AccountState>,
    pub tokens: BTreeMap<TokenId, TokenInfo>,
    pub topics: BTreeMap<TopicId, TopicState>,
    pub records: HashMap<TransactionId, TransactionRecord>,
    pub history: Vec<ProcessedTransaction>,
    pub next_entity_num: u64,
}

type Applied = Result<TransactionReceipt, Status>;

impl LedgerState {
    pub fn new() -> Self {
        Self {
            next_entity_num: 1,
            ..Default::default()
        }
    }

    pub fn add_account(&mut self, id: AccountId, key: Key, hbars: Hbar) {
        self.next_entity_num = self.next_entity_num.max(id.num + 1);
        self.accounts.insert(
            id,
            AccountState {
                key,
                hbars,
                tokens: BTreeMap::new(),
            },
        );
    }

    fn next_num(&mut self) -> u64 {
        let num = self.next_entity_num;
        self.next_entity_num += 1;
        num
    }

    pub fn balance(&self, id: &AccountId) -> Option<AccountBalance> {
        self.accounts.get(id).map(|account| AccountBalance {
            account_id: *id,
            hbars: account.hbars,
            tokens: account.tokens.clone(),
        })
    }

    /// Deduct `fee` from `payer`, failing when the balance cannot cover it.
    pub fn charge_fee(&mut self, payer: &AccountId, fee: Hbar) -> Result<(), Status> {
        let account = self
            .accounts
            .get_mut(payer)
            .ok_or(Status::InvalidAccountId)?;
        account.hbars = account
            .hbars
            .checked_sub(fee)
            .filter(|left| *left >= Hbar::ZERO)
            .ok_or(Status::InsufficientPayerBalance)?;
        Ok(())
    }

    fn require(&self, account: &AccountId, signers: &BTreeSet<PublicKey>) -> Result<(), Status> {
        let state = self
            .accounts
            .get(account)
            .ok_or(Status::InvalidAccountId)?;
        if !state.key.is_satisfied_by(signers) {
            return Err(Status::InvalidSignature);
        }
        Ok(())
    }

    /// Apply `body`, returning the receipt or the failing status.
    pub fn apply(
        &mut self,
        transaction_id: TransactionId,
        body: &TransactionBody,
        signers: &BTreeSet<PublicKey>,
        consensus_timestamp_nanos: i64,
        visible_at: Instant,
    ) -> Applied {
        let receipt = TransactionReceipt::with_status(transaction_id, Status::Success);
        match body {
            TransactionBody::TokenCreate(create) => self.token_create(receipt, create, signers),
            TransactionBody::TokenMint { token_id, amount } => {
                self.token_mint(receipt, token_id, *amount, signers)
            }
            TransactionBody::TokenAssociate {
                account_id,
                token_ids,
            } => self.token_associate(receipt, account_id, token_ids, signers),
            TransactionBody::TokenTransfer { transfers } => {
                self.token_transfer(receipt, transfers, signers)
            }
            TransactionBody::TopicCreate { memo, submit_key } => {
                self.topic_create(receipt, memo, submit_key.clone())
            }
            TransactionBody::TopicMessageSubmit { topic_id, message } => self.topic_submit(
                receipt,
                topic_id,
                message,
                signers,
                consensus_timestamp_nanos,
                visible_at,
            ),
        }
    }

    fn token_create(
        &mut self,
        mut receipt: TransactionReceipt,
        create: &TokenCreate,
        signers: &BTreeSet<PublicKey>,
    ) -> Applied {
        if create.name.trim().is_empty() {
            return Err(Status::MissingTokenName);
        }
        if create.symbol.trim().is_empty() {
            return Err(Status::MissingTokenSymbol);
        }
        if create.decimals > MAX_TOKEN_DECIMALS {
            return Err(Status::InvalidTokenDecimals);
        }
        self.require(&create.treasury_account_id, signers)?;
        if let Some(admin) = &create.admin_key {
            if !admin.is_satisfied_by(signers) {
                return Err(Status::InvalidSignature);
            }
        }

        let token_id = TokenId::new(self.next_num());
        self.tokens.insert(
            token_id,
            TokenInfo {
                token_id,
                name: create.name.clone(),
                symbol: create.symbol.clone(),
                decimals: create.decimals,
                total_supply: create.initial_supply,
                treasury_account_id: create.treasury_account_id,
                admin_key: create.admin_key.clone(),
                supply_key: create.supply_key.clone(),
                freeze_default: create.freeze_default,
            },
        );
        if let Some(treasury) = self.accounts.get_mut(&create.treasury_account_id) {
            treasury.tokens.insert(token_id, create.initial_supply);
        }
        receipt.token_id = Some(token_id);
        Ok(receipt)
    }

    fn token_mint(
        &mut self,
        mut receipt: TransactionReceipt,
        token_id: &TokenId,
        amount: u64,
        signers: &BTreeSet<PublicKey>,
    ) -> Applied {
        let token = self.tokens.get(token_id).ok_or(Status::InvalidTokenId)?;
        let supply_key = token.supply_key.as_ref().ok_or(Status::TokenHasNoSupplyKey)?;
        if !supply_key.is_satisfied_by(signers) {
            return Err(Status::InvalidSignature);
        }
        if amount == 0 {
            return Err(Status::InvalidTransactionBody);
        }
        let treasury_id = token.treasury_account_id;
        let new_supply = token
            .total_supply
            .checked_add(amount)
            .filter(|supply| *supply <= i64::MAX as u64)
            .ok_or(Status::AmountExceedsAllowance)?;
        let treasury = self
            .accounts
            .get_mut(&treasury_id)
            .ok_or(Status::InvalidAccountId)?;
        let held = treasury.tokens.entry(*token_id).or_insert(0);
        *held += amount;

        if let Some(token) = self.tokens.get_mut(token_id) {
            token.total_supply = new_supply;
        }
        receipt.total_supply = Some(new_supply);
        Ok(receipt)
    }

    fn token_associate(
        &mut self,
        receipt: TransactionReceipt,
        account_id: &AccountId,
        token_ids: &[TokenId],
        signers: &BTreeSet<PublicKey>,
    ) -> Applied {
        self.require(account_id, signers)?;
        if token_ids.is_empty() {
            return Err(Status::InvalidTransactionBody);
        }
        for token_id in token_ids {
            if !self.tokens.contains_key(token_id) {
                return Err(Status::InvalidTokenId);
            }
        }
        let account = self
            .accounts
            .get_mut(account_id)
            .ok_or(Status::InvalidAccountId)?;
        if token_ids.iter().any(|id| account.tokens.contains_key(id)) {
            return Err(Status::TokenAlreadyAssociatedToAccount);
        }
        for token_id in token_ids {
            account.tokens.insert(*token_id, 0);
        }
        Ok(receipt)
    }

    fn token_transfer(
        &mut self,
        receipt: TransactionReceipt,
        transfers: &[TokenTransfer],
        signers: &BTreeSet<PublicKey>,
    ) -> Applied {
        if transfers.is_empty() {
            return Err(Status::EmptyTokenTransferAccountAmounts);
        }

        let mut sums: BTreeMap<TokenId, i128> = BTreeMap::new();
        let mut net: BTreeMap<(TokenId, AccountId), i128> = BTreeMap::new();
        for leg in transfers {
            *sums.entry(leg.token_id).or_insert(0) += leg.amount as i128;
            *net.entry((leg.token_id, leg.account_id)).or_insert(0) += leg.amount as i128;
        }
        if sums.values().any(|sum| *sum != 0) {
            return Err(Status::TransferAmountsNotZeroSum);
        }
        for token_id in sums.keys() {
            if !self.tokens.contains_key(token_id) {
                return Err(Status::InvalidTokenId);
            }
        }
        for leg in transfers.iter().filter(|leg| leg.amount < 0) {
            self.require(&leg.account_id, signers)?;
        }

        let mut updated = Vec::with_capacity(net.len());
        for ((token_id, account_id), delta) in &net {
            let account = self
                .accounts
                .get(account_id)
                .ok_or(Status::InvalidAccountId)?;
            let held = *account
                .tokens
                .get(token_id)
                .ok_or(Status::TokenNotAssociatedToAccount)? as i128;
            let after = held + delta;
            if after < 0 {
                return Err(Status::InsufficientTokenBalance);
            }
            let after = u64::try_from(after).map_err(|_| Status::AmountExceedsAllowance)?;
            updated.push((*token_id, *account_id, after));
        }

        for (token_id, account_id, after) in updated {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.tokens.insert(token_id, after);
            }
        }
        Ok(receipt)
    }

    fn topic_create(
        &mut self,
        mut receipt: TransactionReceipt,
        memo: &str,
        submit_key: Option<Key>,
    ) -> Applied {
        let topic_id = TopicId::new(self.next_num());
        self.topics.insert(
            topic_id,
            TopicState {
                info: TopicInfo {
                    topic_id,
                    memo: memo.to_string(),
                    submit_key,
                    sequence_number: 0,
                },
                messages: Vec::new(),
            },
        );
        receipt.topic_id = Some(topic_id);
        Ok(receipt)
    }

    fn topic_submit(
        &mut self,
        mut receipt: TransactionReceipt,
        topic_id: &TopicId,
        message: &[u8],
        signers: &BTreeSet<PublicKey>,
        consensus_timestamp_nanos: i64,
        visible_at: Instant,
    ) -> Applied {
        let topic = self.topics.get_mut(topic_id).ok_or(Status::InvalidTopicId)?;
        if message.is_empty() {
            return Err(Status::InvalidTopicMessage);
        }
        if let Some(key) = &topic.info.submit_key {
            if !key.is_satisfied_by(signers) {
                return Err(Status::InvalidSignature);
            }
        }
        topic.info.sequence_number += 1;
        let sequence_number = topic.info.sequence_number;
        topic.messages.push((
            TopicMessage {
                topic_id: *topic_id,
                sequence_number,
                contents: message.to_vec(),
                consensus_timestamp_nanos,
            },
            visible_at,
        ));
        receipt.topic_sequence_number = Some(sequence_number);
        Ok(receipt)
    }
}
