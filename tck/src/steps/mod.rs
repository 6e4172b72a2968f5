//! Built-in step definitions.
//!
//! Handlers are plain functions returning a boxed future so they can be
//! stored as [`StepFn`](crate::scenarios::StepFn) pointers.

mod consensus;
mod token;

use ledger_common::Hbar;

use crate::ensure_step;
use crate::error::StepFailure;
use crate::fixtures::TestAccount;
use crate::scenarios::{StepRegistry, World};

/// Registry with every built-in step.
pub fn registry() -> Result<StepRegistry, regex_lite::Error> {
    let mut registry = StepRegistry::new();
    consensus::register(&mut registry)?;
    token::register(&mut registry)?;
    Ok(registry)
}

/// Position named by an ordinal word, `first` being 1.
pub(crate) fn ordinal(word: &str) -> Result<usize, StepFailure> {
    match word.to_ascii_lowercase().as_str() {
        "first" => Ok(1),
        "second" => Ok(2),
        "third" => Ok(3),
        "fourth" => Ok(4),
        other => Err(StepFailure::InvalidArgument(format!(
            "Unknown ordinal '{}'",
            other
        ))),
    }
}

/// Fail unless `account` holds strictly more than `hbars`.
pub(crate) async fn ensure_hbar_above(
    world: &World,
    account: &TestAccount,
    hbars: i64,
) -> Result<(), StepFailure> {
    let balance = world.client.account_balance(&account.id).await?;
    if log::log_enabled!(log::Level::Info) {
        log::info!("Account #{} ({}) has {}", account.index, account.id, balance.hbars);
    }
    ensure_step!(
        balance.hbars > Hbar::new(hbars),
        "{} holds {}, expected more than {}",
        account.id,
        balance.hbars,
        Hbar::new(hbars)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal("first").unwrap(), 1);
        assert_eq!(ordinal("Fourth").unwrap(), 4);
        assert!(ordinal("fifth").is_err());
    }

    #[test]
    fn test_registry_builds_without_ambiguity() {
        let registry = registry().unwrap();
        assert!(!registry.is_empty());

        for text in [
            "a first account with more than 10 hbars",
            "A Hedera account with more than 10 hbar",
            "A first hedera account with more than 10 hbar",
            "A first hedera account with more than 10 hbar and 100 HTT tokens",
            "A second Hedera account with 0 hbar and 100 HTT tokens",
            "The fourth account holds 15 HTT tokens",
            "The first account has submitted the transaction",
            "The first account submits the transaction",
        ] {
            assert!(registry.find(text).is_ok(), "{}", text);
        }
    }
}
