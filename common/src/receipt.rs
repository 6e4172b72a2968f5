//! Outcome of submitted transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hbar::Hbar;
use crate::id::{AccountId, TokenId, TopicId, TransactionId};

macro_rules! statuses {
    ($($(#[$meta:meta])* $variant:ident => $code:literal,)*) => {
        /// Status code reported by the network for a transaction.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Status {
            $(
                $(#[$meta])*
                #[serde(rename = $code)]
                $variant,
            )*
        }

        impl Status {
            /// Wire name, e.g. `INSUFFICIENT_TOKEN_BALANCE`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Status::$variant => $code,)*
                }
            }
        }
    };
}

statuses! {
    /// Transaction reached consensus and was applied.
    Success => "SUCCESS",
    /// A required signature is missing or does not verify.
    InvalidSignature => "INVALID_SIGNATURE",
    /// The payer cannot cover the transaction fee.
    InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
    /// A debited account holds fewer tokens than requested.
    InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
    /// A transfer leg touches an account not associated with the token.
    TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
    /// The account is already associated with the token.
    TokenAlreadyAssociatedToAccount => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT",
    /// Mint or burn on a token created without a supply key.
    TokenHasNoSupplyKey => "TOKEN_HAS_NO_SUPPLY_KEY",
    /// The token does not exist.
    InvalidTokenId => "INVALID_TOKEN_ID",
    /// The topic does not exist.
    InvalidTopicId => "INVALID_TOPIC_ID",
    /// The account does not exist.
    InvalidAccountId => "INVALID_ACCOUNT_ID",
    /// Transfer legs do not sum to zero.
    TransferAmountsNotZeroSum => "TRANSFER_AMOUNTS_NOT_ZERO_SUM",
    /// The transaction id was already used.
    DuplicateTransaction => "DUPLICATE_TRANSACTION",
    /// A token transfer with no legs.
    EmptyTokenTransferAccountAmounts => "EMPTY_TOKEN_TRANSFER_ACCOUNT_AMOUNTS",
    /// Decimals out of range.
    InvalidTokenDecimals => "INVALID_TOKEN_DECIMALS",
    /// Token created without a name.
    MissingTokenName => "MISSING_TOKEN_NAME",
    /// Token created without a symbol.
    MissingTokenSymbol => "MISSING_TOKEN_SYMBOL",
    /// Zero mint amount or similar malformed body.
    InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
    /// Empty topic message.
    InvalidTopicMessage => "INVALID_TOPIC_MESSAGE",
    /// Amount arithmetic would overflow.
    AmountExceedsAllowance => "AMOUNT_EXCEEDS_ALLOWANCE",
    /// No receipt is known for the transaction id.
    ReceiptNotFound => "RECEIPT_NOT_FOUND",
}

impl Status {
    /// Whether the status denotes an applied transaction.
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by a node when a transaction is accepted for
/// consensus. Finality must be awaited separately through the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Id of the submitted transaction.
    pub transaction_id: TransactionId,
}

/// Consensus outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Id of the transaction.
    pub transaction_id: TransactionId,
    /// Final status.
    pub status: Status,
    /// Token created by a token-create transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    /// Topic created by a topic-create transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    /// Supply after a mint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<u64>,
    /// Topic sequence number assigned to a submitted message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_sequence_number: Option<u64>,
}

impl TransactionReceipt {
    /// Receipt carrying only a status.
    pub fn with_status(transaction_id: TransactionId, status: Status) -> Self {
        Self {
            transaction_id,
            status,
            token_id: None,
            topic_id: None,
            total_supply: None,
            topic_sequence_number: None,
        }
    }
}

/// Receipt plus accounting details of a processed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The receipt.
    pub receipt: TransactionReceipt,
    /// Account charged for the transaction.
    pub payer: AccountId,
    /// Fee charged to the payer.
    pub transaction_fee: Hbar,
    /// SHA3-256 of the signed body.
    pub transaction_hash: String,
    /// Transaction memo.
    #[serde(default)]
    pub memo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(Status::Success.to_string(), "SUCCESS");
        assert_eq!(
            Status::TokenHasNoSupplyKey.to_string(),
            "TOKEN_HAS_NO_SUPPLY_KEY"
        );
        assert_eq!(
            serde_json::to_string(&Status::InsufficientTokenBalance).unwrap(),
            "\"INSUFFICIENT_TOKEN_BALANCE\""
        );
    }

    #[test]
    fn test_is_success() {
        assert!(Status::Success.is_success());
        assert!(!Status::InvalidSignature.is_success());
    }
}
