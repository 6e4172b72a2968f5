//! Query results returned by the network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crypto::Key;
use crate::hbar::Hbar;
use crate::id::{AccountId, TokenId, TopicId};

/// Balances held by one account.
///
/// `tokens` holds an entry for every token the account is associated with,
/// including those at zero balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account queried.
    pub account_id: AccountId,
    /// Native balance.
    pub hbars: Hbar,
    /// Token balances of associated tokens.
    #[serde(default)]
    pub tokens: BTreeMap<TokenId, u64>,
}

impl AccountBalance {
    /// Balance of `token`, zero when not associated.
    pub fn token_balance(&self, token: &TokenId) -> u64 {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    /// Whether the account is associated with `token`.
    pub fn is_associated(&self, token: &TokenId) -> bool {
        self.tokens.contains_key(token)
    }
}

/// Token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token id.
    pub token_id: TokenId,
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimal places.
    pub decimals: u32,
    /// Current total supply in the smallest unit.
    pub total_supply: u64,
    /// Treasury holding un-circulated supply.
    pub treasury_account_id: AccountId,
    /// Key allowed to update or delete the token.
    pub admin_key: Option<Key>,
    /// Key allowed to mint and burn. `None` for fixed supply tokens.
    pub supply_key: Option<Key>,
    /// Whether new associations start frozen.
    pub freeze_default: bool,
}

/// Topic metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    /// Topic id.
    pub topic_id: TopicId,
    /// Memo set at creation.
    pub memo: String,
    /// Key required to submit messages, `None` for open topics.
    pub submit_key: Option<Key>,
    /// Number of messages accepted so far.
    pub sequence_number: u64,
}

/// A message as delivered by the mirror feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    /// Topic the message belongs to.
    pub topic_id: TopicId,
    /// Position within the topic, starting at 1.
    pub sequence_number: u64,
    /// Raw message contents.
    pub contents: Vec<u8>,
    /// Consensus timestamp, nanoseconds since the Unix epoch.
    pub consensus_timestamp_nanos: i64,
}

impl TopicMessage {
    /// Contents decoded as UTF-8, lossily.
    pub fn contents_str(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_balance_defaults_to_zero() {
        let token = TokenId::new(5000);
        let mut balance = AccountBalance {
            account_id: AccountId::new(1001),
            hbars: Hbar::new(10),
            tokens: BTreeMap::new(),
        };

        assert_eq!(balance.token_balance(&token), 0);
        assert!(!balance.is_associated(&token));

        balance.tokens.insert(token, 0);
        assert!(balance.is_associated(&token));
        assert_eq!(balance.token_balance(&token), 0);
    }
}
