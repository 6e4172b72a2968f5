#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Loading suite configuration from disk

use std::io::Write;
use std::path::Path;

use ledger_common::AccountId;
use ledger_tck::config::SuiteConfig;
use ledger_tck::fixtures::{SettlementMode, ShortfallPolicy};
use tempfile::NamedTempFile;

#[test]
fn test_example_config_loads() {
    let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml"));
    let config = SuiteConfig::from_file(path).unwrap();

    assert_eq!(config.accounts.len(), 5);
    assert_eq!(config.accounts[0].id, AccountId::new(1001));
    assert_eq!(config.shortfall_policy, ShortfallPolicy::Skip);
    assert_eq!(config.settlement_mode, SettlementMode::Atomic);
    assert_eq!(config.fees.token_transfer, 100_000);

    // Raw, DER and 0x-prefixed keys all decode to distinct keys
    let mut public_keys: Vec<_> = config
        .accounts
        .iter()
        .map(|account| account.private_key.public_key())
        .collect();
    public_keys.sort();
    public_keys.dedup();
    assert_eq!(public_keys.len(), 5);
}

#[test]
fn test_der_and_raw_keys_match() {
    let raw = "1111111111111111111111111111111111111111111111111111111111111111";
    let yaml = format!(
        r#"
accounts:
  - id: "0.0.2001"
    private_key: "302e020100300506032b657004220420{raw}"
  - id: "0.0.2002"
    private_key: "{raw}"
"#
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = SuiteConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config.accounts[0].private_key.public_key(),
        config.accounts[1].private_key.public_key()
    );
    assert_eq!(config.accounts[1].hbar, 1000);
    assert_eq!(config.mirror_timeout_ms, 10_000);
}

#[test]
fn test_invalid_file_names_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"accounts:\n  - id: \"0.0.1\"\n    private_key: \"not-hex\"\n")
        .unwrap();

    let err = SuiteConfig::from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Invalid config file"), "{}", message);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SuiteConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
