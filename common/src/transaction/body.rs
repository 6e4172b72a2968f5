use serde::{Deserialize, Serialize};

use crate::crypto::Key;
use crate::id::{AccountId, TokenId, TopicId};

/// Parameters of a new fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreate {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal places.
    pub decimals: u32,
    /// Supply credited to the treasury at creation.
    pub initial_supply: u64,
    /// Treasury account; must sign the creation.
    pub treasury_account_id: AccountId,
    /// Admin key; must sign the creation when set.
    #[serde(default)]
    pub admin_key: Option<Key>,
    /// Supply key. Without one the supply is fixed.
    #[serde(default)]
    pub supply_key: Option<Key>,
    /// Whether new associations start frozen.
    #[serde(default)]
    pub freeze_default: bool,
}

impl TokenCreate {
    /// Token with the given name and symbol, two decimals, no supply, and
    /// `treasury` as treasury. Keys are unset.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, treasury: AccountId) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: 2,
            initial_supply: 0,
            treasury_account_id: treasury,
            admin_key: None,
            supply_key: None,
            freeze_default: false,
        }
    }

    /// Set decimals.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Set the initial supply.
    pub fn with_initial_supply(mut self, supply: u64) -> Self {
        self.initial_supply = supply;
        self
    }

    /// Set the admin key.
    pub fn with_admin_key(mut self, key: impl Into<Key>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    /// Set the supply key.
    pub fn with_supply_key(mut self, key: impl Into<Key>) -> Self {
        self.supply_key = Some(key.into());
        self
    }

    /// Set whether associations start frozen.
    pub fn with_freeze_default(mut self, freeze: bool) -> Self {
        self.freeze_default = freeze;
        self
    }
}

/// One leg of a token transfer. Negative amounts debit the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    /// Token moved.
    pub token_id: TokenId,
    /// Account debited or credited.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: i64,
}

/// Operation carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionBody {
    /// Create a token.
    TokenCreate(TokenCreate),
    /// Mint additional supply into the treasury.
    TokenMint {
        /// Token minted.
        token_id: TokenId,
        /// Amount in the smallest unit.
        amount: u64,
    },
    /// Associate an account with tokens.
    TokenAssociate {
        /// Account to associate; must sign.
        account_id: AccountId,
        /// Tokens to associate with.
        token_ids: Vec<TokenId>,
    },
    /// Move tokens between accounts.
    TokenTransfer {
        /// Transfer legs, zero-sum per token.
        transfers: Vec<TokenTransfer>,
    },
    /// Create a consensus topic.
    TopicCreate {
        /// Topic memo.
        memo: String,
        /// Key required to submit messages.
        #[serde(default)]
        submit_key: Option<Key>,
    },
    /// Submit a message to a topic.
    TopicMessageSubmit {
        /// Target topic.
        topic_id: TopicId,
        /// Message bytes.
        message: Vec<u8>,
    },
}

impl TransactionBody {
    /// Short operation name used in logs and fee schedules.
    pub fn name(&self) -> &'static str {
        match self {
            TransactionBody::TokenCreate(_) => "TokenCreate",
            TransactionBody::TokenMint { .. } => "TokenMint",
            TransactionBody::TokenAssociate { .. } => "TokenAssociate",
            TransactionBody::TokenTransfer { .. } => "TokenTransfer",
            TransactionBody::TopicCreate { .. } => "TopicCreate",
            TransactionBody::TopicMessageSubmit { .. } => "TopicMessageSubmit",
        }
    }
}
