//! Suite configuration.
//!
//! Loaded from YAML, either from an explicit path or from the file named by
//! `LEDGER_BDD_CONFIG`. Without a file, a fresh set of accounts with random
//! keys is generated so features can run hermetically.
//!
//! ```yaml
//! network: simulated
//! accounts:
//!   - id: "0.0.1001"
//!     private_key: "302e020100300506032b657004220420..."
//!     hbar: 1000
//! mirror_lag_ms: 1500
//! mirror_timeout_ms: 10000
//! poll_interval_ms: 100
//! shortfall_policy: skip
//! settlement_mode: atomic
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ledger_common::{AccountId, PrivateKey};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::fixtures::{SettlementMode, ShortfallPolicy};
use crate::network::FeeSchedule;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LEDGER_BDD_CONFIG";
/// Environment override for [`SuiteConfig::shortfall_policy`].
pub const SHORTFALL_POLICY_ENV: &str = "LEDGER_BDD_SHORTFALL_POLICY";
/// Environment override for [`SuiteConfig::settlement_mode`].
pub const SETTLEMENT_MODE_ENV: &str = "LEDGER_BDD_SETTLEMENT_MODE";

/// Accounts generated when no config file is given.
pub const DEFAULT_ACCOUNT_COUNT: usize = 5;
/// Hbar balance of each generated account.
pub const DEFAULT_ACCOUNT_HBAR: i64 = 1000;

fn default_network() -> String {
    "simulated".to_string()
}

fn default_hbar() -> i64 {
    DEFAULT_ACCOUNT_HBAR
}

fn default_mirror_lag_ms() -> u64 {
    1500
}

fn default_mirror_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// One pre-funded test account. Index 0 in the list is the treasury.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Ledger id.
    pub id: AccountId,
    /// Raw or DER hex private key.
    pub private_key: PrivateKey,
    /// Genesis hbar balance on the simulated network.
    #[serde(default = "default_hbar")]
    pub hbar: i64,
}

/// Complete suite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Network name used in logs.
    #[serde(default = "default_network")]
    pub network: String,

    /// Test accounts by index.
    pub accounts: Vec<AccountConfig>,

    /// Delay before messages appear on the mirror feed.
    #[serde(default = "default_mirror_lag_ms")]
    pub mirror_lag_ms: u64,

    /// How long to wait for a message on the mirror feed.
    #[serde(default = "default_mirror_timeout_ms")]
    pub mirror_timeout_ms: u64,

    /// Mirror feed polling interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// What reconciliation does when the treasury cannot fund a top-up.
    #[serde(default)]
    pub shortfall_policy: ShortfallPolicy,

    /// How multi-party transfers are submitted.
    #[serde(default)]
    pub settlement_mode: SettlementMode,

    /// Fees charged by the simulated network.
    #[serde(default)]
    pub fees: FeeSchedule,
}

impl SuiteConfig {
    /// `count` accounts with fresh keys, ids `0.0.1001` upwards.
    pub fn generated(count: usize, hbar: i64) -> Self {
        let accounts = (0..count as u64)
            .map(|i| AccountConfig {
                id: AccountId::new(1001 + i),
                private_key: PrivateKey::generate(),
                hbar,
            })
            .collect();
        Self {
            network: default_network(),
            accounts,
            mirror_lag_ms: default_mirror_lag_ms(),
            mirror_timeout_ms: default_mirror_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            shortfall_policy: ShortfallPolicy::default(),
            settlement_mode: SettlementMode::default(),
            fees: FeeSchedule::default(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SuiteConfig =
            serde_yaml::from_str(yaml).context("Failed to parse suite config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load from `LEDGER_BDD_CONFIG` if set, otherwise generate accounts,
    /// then apply environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::generated(DEFAULT_ACCOUNT_COUNT, DEFAULT_ACCOUNT_HBAR),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up by variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SHORTFALL_POLICY_ENV) {
            self.shortfall_policy = value
                .parse()
                .with_context(|| format!("Invalid {}", SHORTFALL_POLICY_ENV))?;
        }
        if let Some(value) = lookup(SETTLEMENT_MODE_ENV) {
            self.settlement_mode = value
                .parse()
                .with_context(|| format!("Invalid {}", SETTLEMENT_MODE_ENV))?;
        }
        Ok(())
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(anyhow!("Config must define at least one account"));
        }
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id) {
                return Err(anyhow!("Duplicate account id {}", account.id));
            }
            if account.hbar < 0 {
                return Err(anyhow!("Negative hbar balance for account {}", account.id));
            }
        }
        if self.mirror_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return Err(anyhow!("mirror_timeout_ms and poll_interval_ms must be positive"));
        }
        if self.poll_interval_ms > self.mirror_timeout_ms {
            return Err(anyhow!(
                "poll_interval_ms ({}) exceeds mirror_timeout_ms ({})",
                self.poll_interval_ms,
                self.mirror_timeout_ms
            ));
        }
        Ok(())
    }

    /// Account at `index`.
    pub fn account(&self, index: usize) -> Option<&AccountConfig> {
        self.accounts.get(index)
    }

    /// Mirror feed lag.
    pub fn mirror_lag(&self) -> Duration {
        Duration::from_millis(self.mirror_lag_ms)
    }

    /// Mirror feed wait timeout.
    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_timeout_ms)
    }

    /// Mirror feed polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_is_valid() {
        let config = SuiteConfig::generated(4, 1000);

        assert!(config.validate().is_ok());
        assert_eq!(config.accounts.len(), 4);
        assert_eq!(config.account(0).unwrap().id, AccountId::new(1001));
        assert_eq!(config.account(3).unwrap().id, AccountId::new(1004));
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Skip);
        assert_eq!(config.settlement_mode, SettlementMode::Atomic);
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let key = PrivateKey::generate();
        let yaml = format!(
            "accounts:\n  - id: \"0.0.2\"\n    private_key: \"{}\"\nsettlement_mode: independent\n",
            key.to_der_hex()
        );

        let config = SuiteConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.network, "simulated");
        assert_eq!(config.accounts[0].hbar, DEFAULT_ACCOUNT_HBAR);
        assert_eq!(
            config.accounts[0].private_key.public_key(),
            key.public_key()
        );
        assert_eq!(config.settlement_mode, SettlementMode::Independent);
        assert_eq!(config.mirror_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_duplicate_accounts() {
        let mut config = SuiteConfig::generated(2, 10);
        config.accounts[1].id = config.accounts[0].id;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_timings() {
        let mut config = SuiteConfig::generated(1, 10);
        config.poll_interval_ms = 20_000;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = SuiteConfig::generated(1, 10);
        config
            .apply_overrides(|name| match name {
                SHORTFALL_POLICY_ENV => Some("fail".to_string()),
                SETTLEMENT_MODE_ENV => Some("independent".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.shortfall_policy, ShortfallPolicy::Fail);
        assert_eq!(config.settlement_mode, SettlementMode::Independent);
        assert!(config
            .apply_overrides(|_| Some("sometimes".to_string()))
            .is_err());
    }
}
