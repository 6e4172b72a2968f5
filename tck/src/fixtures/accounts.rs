use ledger_common::{AccountId, PrivateKey, PublicKey};

/// Index of the treasury account.
pub const TREASURY_INDEX: usize = 0;

/// A configured account taking part in a scenario.
///
/// The index is its identity; index [`TREASURY_INDEX`] is the treasury and
/// default operator.
#[derive(Debug, Clone)]
pub struct TestAccount {
    /// Position in the configured account list.
    pub index: usize,
    /// Ledger id.
    pub id: AccountId,
    /// Signing key.
    pub key: PrivateKey,
}

impl TestAccount {
    /// Public half of the signing key.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Whether this is the treasury.
    pub fn is_treasury(&self) -> bool {
        self.index == TREASURY_INDEX
    }
}

impl PartialEq for TestAccount {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.id == other.id
    }
}

impl Eq for TestAccount {}
