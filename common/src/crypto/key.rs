//! Composite signing requirements.
//!
//! A [`Key`] is what an entity (account, token role, topic) requires to be
//! satisfied before the network accepts a transaction touching it. A
//! [`KeyList`] with a threshold is the M-of-N key used for multi-party
//! authorisation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::PublicKey;

/// A signing requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// A single Ed25519 public key.
    Single(PublicKey),
    /// A list of keys, all or M of which must sign.
    List(KeyList),
}

impl Key {
    /// Whether the set of public keys that signed satisfies this requirement.
    pub fn is_satisfied_by(&self, signers: &BTreeSet<PublicKey>) -> bool {
        match self {
            Key::Single(key) => signers.contains(key),
            Key::List(list) => list.is_satisfied_by(signers),
        }
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Single(key)
    }
}

impl From<KeyList> for Key {
    fn from(list: KeyList) -> Self {
        Key::List(list)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Single(key) => write!(f, "{}", key),
            Key::List(list) => write!(f, "{}", list),
        }
    }
}

/// Ordered list of keys with an optional signing threshold.
///
/// Without a threshold every member must be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    /// Member keys, possibly nested lists.
    pub keys: Vec<Key>,
    /// Number of members required, `None` meaning all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
}

impl KeyList {
    /// A list requiring every member.
    pub fn of<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            threshold: None,
        }
    }

    /// An M-of-N list.
    pub fn threshold<I, K>(keys: I, threshold: u32) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            threshold: Some(threshold),
        }
    }

    /// Number of member keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the list has no members.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Effective number of members that must be satisfied.
    pub fn required(&self) -> usize {
        self.threshold
            .map(|t| t as usize)
            .unwrap_or(self.keys.len())
    }

    /// Whether enough members are satisfied by `signers`.
    ///
    /// An empty list or a zero threshold is never satisfied.
    pub fn is_satisfied_by(&self, signers: &BTreeSet<PublicKey>) -> bool {
        let required = self.required();
        if required == 0 || required > self.keys.len() {
            return false;
        }
        let satisfied = self
            .keys
            .iter()
            .filter(|key| key.is_satisfied_by(signers))
            .count();
        satisfied >= required
    }
}

impl fmt::Display for KeyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{}[", self.required(), self.keys.len())?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn signers(keys: &[&PrivateKey]) -> BTreeSet<PublicKey> {
        keys.iter().map(|k| k.public_key()).collect()
    }

    #[test]
    fn test_single_key() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let key = Key::from(a.public_key());

        assert!(key.is_satisfied_by(&signers(&[&a])));
        assert!(!key.is_satisfied_by(&signers(&[&b])));
    }

    #[test]
    fn test_one_of_two_threshold() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let c = PrivateKey::generate();
        let list = KeyList::threshold([a.public_key(), b.public_key()], 1);

        assert!(list.is_satisfied_by(&signers(&[&a])));
        assert!(list.is_satisfied_by(&signers(&[&b])));
        assert!(!list.is_satisfied_by(&signers(&[&c])));
        assert_eq!(list.to_string().split('[').next(), Some("1-of-2"));
    }

    #[test]
    fn test_all_of_list() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let list = KeyList::of([a.public_key(), b.public_key()]);

        assert!(!list.is_satisfied_by(&signers(&[&a])));
        assert!(list.is_satisfied_by(&signers(&[&a, &b])));
    }

    #[test]
    fn test_nested_list() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let c = PrivateKey::generate();
        let inner = KeyList::threshold([b.public_key(), c.public_key()], 1);
        let outer = KeyList::of([Key::from(a.public_key()), Key::from(inner)]);

        assert!(outer.is_satisfied_by(&signers(&[&a, &c])));
        assert!(!outer.is_satisfied_by(&signers(&[&b, &c])));
    }

    #[test]
    fn test_degenerate_thresholds_never_satisfied() {
        let a = PrivateKey::generate();
        let all = signers(&[&a]);

        assert!(!KeyList::threshold([a.public_key()], 0).is_satisfied_by(&all));
        assert!(!KeyList::threshold([a.public_key()], 2).is_satisfied_by(&all));
        assert!(!KeyList::of(Vec::<PublicKey>::new()).is_satisfied_by(&all));
    }
}
