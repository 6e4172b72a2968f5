//! Entity and transaction identifiers.
//!
//! Entities are addressed as `shard.realm.num`, e.g. `0.0.1001`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// Error returned when an entity id string is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid entity id '{0}': expected shard.realm.num")]
pub struct InvalidEntityId(pub String);

fn parse_triple(s: &str) -> Result<(u64, u64, u64), InvalidEntityId> {
    let err = || InvalidEntityId(s.to_string());
    let mut parts = s.trim().split('.');
    let mut next = || -> Result<u64, InvalidEntityId> {
        parts.next().ok_or_else(err)?.parse().map_err(|_| err())
    };
    let triple = (next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(err());
    }
    Ok(triple)
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            /// Shard number.
            pub shard: u64,
            /// Realm number.
            pub realm: u64,
            /// Entity number.
            pub num: u64,
        }

        impl $name {
            /// Id in shard 0, realm 0.
            pub const fn new(num: u64) -> Self {
                Self { shard: 0, realm: 0, num }
            }
        }

        impl FromStr for $name {
            type Err = InvalidEntityId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num) = parse_triple(s)?;
                Ok(Self { shard, realm, num })
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidEntityId;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

entity_id!(
    /// Ledger account.
    AccountId
);
entity_id!(
    /// Fungible token.
    TokenId
);
entity_id!(
    /// Consensus topic.
    TopicId
);

static LAST_VALID_START: AtomicI64 = AtomicI64::new(0);

/// Identifies one submission: the paying account plus a valid-start
/// timestamp in nanoseconds since the epoch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId {
    /// Account paying for the transaction.
    pub account_id: AccountId,
    /// Valid-start time, nanoseconds since the Unix epoch.
    pub valid_start_nanos: i64,
}

impl TransactionId {
    /// Generate a fresh id for `payer`.
    ///
    /// Valid-start times are strictly increasing within the process, so two
    /// ids generated back to back never collide even on a coarse clock.
    pub fn generate(payer: AccountId) -> Self {
        let now = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(i64::MAX / 2);
        let previous = LAST_VALID_START
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        Self {
            account_id: payer,
            valid_start_nanos: now.max(previous + 1),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id,
            self.valid_start_nanos.div_euclid(1_000_000_000),
            self.valid_start_nanos.rem_euclid(1_000_000_000)
        )
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: AccountId = "0.0.1001".parse().unwrap();
        assert_eq!(id, AccountId::new(1001));
        assert_eq!(id.to_string(), "0.0.1001");

        let token: TokenId = "1.2.3".parse().unwrap();
        assert_eq!((token.shard, token.realm, token.num), (1, 2, 3));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.1.2".parse::<AccountId>().is_err());
        assert!("0.0.x".parse::<TopicId>().is_err());
        assert!("".parse::<TokenId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = TopicId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0.0.7\"");
        assert_eq!(serde_json::from_str::<TopicId>(&json).unwrap(), id);
    }

    #[test]
    fn test_transaction_ids_strictly_increase() {
        let payer = AccountId::new(2);
        let ids: Vec<_> = (0..100).map(|_| TransactionId::generate(payer)).collect();

        for pair in ids.windows(2) {
            assert!(pair[1].valid_start_nanos > pair[0].valid_start_nanos);
        }
    }

    #[test]
    fn test_transaction_id_display() {
        let id = TransactionId {
            account_id: AccountId::new(2),
            valid_start_nanos: 1_700_000_000_000_000_042,
        };
        assert_eq!(id.to_string(), "0.0.2@1700000000.000000042");
    }
}
