//! Signed ledger transactions.
//!
//! A transaction is built unfrozen, then frozen with a payer (which fixes
//! its [`TransactionId`]), then signed by every key whose authorisation it
//! needs. Signatures cover the canonical JSON encoding of the id, memo and
//! body, so nothing can change once the first signature is attached.

mod body;

pub use body::{TokenCreate, TokenTransfer, TransactionBody};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeSet;

use crate::crypto::{PrivateKey, PublicKey, Signature};
use crate::error::LedgerError;
use crate::id::{AccountId, TransactionId};

/// A public key together with its signature over the transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// Signer.
    pub public_key: PublicKey,
    /// Signature over [`Transaction::body_bytes`].
    pub signature: Signature,
}

#[derive(Serialize)]
struct SignedPayload<'a> {
    transaction_id: &'a TransactionId,
    memo: &'a str,
    body: &'a TransactionBody,
}

/// A ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    body: TransactionBody,
    #[serde(default)]
    memo: String,
    #[serde(default)]
    transaction_id: Option<TransactionId>,
    #[serde(default)]
    signatures: Vec<SignaturePair>,
}

impl Transaction {
    /// Unfrozen transaction carrying `body`.
    pub fn new(body: TransactionBody) -> Self {
        Self {
            body,
            memo: String::new(),
            transaction_id: None,
            signatures: Vec::new(),
        }
    }

    /// Unfrozen token transfer made of `transfers`.
    pub fn token_transfer(transfers: Vec<TokenTransfer>) -> Self {
        Self::new(TransactionBody::TokenTransfer { transfers })
    }

    /// Set the transaction memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Use an explicit transaction id instead of generating one at freeze.
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// The operation.
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    /// The memo.
    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Id, set once frozen.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    /// Account paying for the transaction, set once frozen.
    pub fn payer(&self) -> Option<AccountId> {
        self.transaction_id.map(|id| id.account_id)
    }

    /// Whether the transaction has an id and can be signed.
    pub fn is_frozen(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// Attached signatures.
    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }

    /// Fix the transaction id with `payer` as fee payer.
    ///
    /// An id supplied through [`Transaction::with_transaction_id`] is kept.
    pub fn freeze_with(&mut self, payer: AccountId) -> &mut Self {
        if self.transaction_id.is_none() {
            self.transaction_id = Some(TransactionId::generate(payer));
        }
        self
    }

    /// Canonical bytes covered by signatures.
    pub fn body_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let transaction_id = self.transaction_id.as_ref().ok_or(LedgerError::NotFrozen)?;
        let payload = SignedPayload {
            transaction_id,
            memo: &self.memo,
            body: &self.body,
        };
        Ok(serde_json::to_vec(&payload)?)
    }

    /// Sign with `key`. Signing twice with the same key is a no-op.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<&mut Self, LedgerError> {
        let public_key = key.public_key();
        if self.signatures.iter().any(|s| s.public_key == public_key) {
            return Ok(self);
        }
        let signature = key.sign(&self.body_bytes()?);
        self.signatures.push(SignaturePair {
            public_key,
            signature,
        });
        Ok(self)
    }

    /// Public keys whose signatures verify against the body bytes.
    pub fn verified_signers(&self) -> Result<BTreeSet<PublicKey>, LedgerError> {
        let bytes = self.body_bytes()?;
        Ok(self
            .signatures
            .iter()
            .filter(|pair| pair.public_key.verify(&bytes, &pair.signature).is_ok())
            .map(|pair| pair.public_key)
            .collect())
    }

    /// Hex SHA3-256 of the body bytes.
    pub fn hash(&self) -> Result<String, LedgerError> {
        let mut hasher = Sha3_256::new();
        hasher.update(self.body_bytes()?);
        Ok(hex::encode(hasher.finalize()))
    }
}
