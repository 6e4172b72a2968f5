// Common helpers for ledger integration tests
//
// Every helper builds on a paused clock so mirror lag and polling advance
// instantly under `#[tokio::test(start_paused = true)]`.

use std::sync::Arc;

use ledger_common::{Client, TokenCreate, TokenId, Transaction, TransactionBody};
use ledger_tck::config::SuiteConfig;
use ledger_tck::fixtures::{ScenarioContext, TestAccount};
use ledger_tck::network::{SimulatedNetwork, SimulatedNetworkBuilder};
use ledger_tck::orchestrator::PausedClock;

/// Five generated accounts with 1000 hbar each
#[allow(dead_code)]
pub fn test_config() -> Arc<SuiteConfig> {
    Arc::new(SuiteConfig::generated(5, 1000))
}

/// Simulated network seeded from `config`
#[allow(dead_code)]
pub fn test_network(config: &SuiteConfig) -> Arc<SimulatedNetwork> {
    Arc::new(
        SimulatedNetworkBuilder::from_config(config)
            .with_clock(Arc::new(PausedClock))
            .build(),
    )
}

/// Network, treasury-operated client and a fresh context
#[allow(dead_code)]
pub fn setup() -> (Arc<SimulatedNetwork>, Client, ScenarioContext) {
    let config = test_config();
    let network = test_network(&config);
    let mut context = ScenarioContext::new(config);
    let treasury = context.treasury().unwrap();
    let client = Client::new(network.clone()).with_operator(treasury.id, treasury.key);
    (network, client, context)
}

/// Create an HTT token held by `treasury` with `supply` initial units
#[allow(dead_code)]
pub async fn create_token(client: &Client, treasury: &TestAccount, supply: u64) -> TokenId {
    let token = TokenCreate::new("Test Token", "HTT", treasury.id)
        .with_decimals(2)
        .with_initial_supply(supply)
        .with_supply_key(treasury.public_key());
    let mut transaction = Transaction::new(TransactionBody::TokenCreate(token));
    client.freeze(&mut transaction).unwrap();
    transaction.sign(&treasury.key).unwrap();
    client
        .execute_and_confirm(transaction)
        .await
        .unwrap()
        .token_id
        .expect("token create receipt carries a token id")
}

/// Number of token transfers that reached consensus successfully
#[allow(dead_code)]
pub fn successful_transfers(network: &SimulatedNetwork) -> usize {
    network.count_history(|processed| {
        matches!(
            processed.transaction.body(),
            TransactionBody::TokenTransfer { .. }
        ) && processed.record.receipt.status.is_success()
    })
}

/// Token balance of `account`
#[allow(dead_code)]
pub async fn token_balance(client: &Client, account: &TestAccount, token_id: &TokenId) -> u64 {
    client
        .account_balance(&account.id)
        .await
        .unwrap()
        .token_balance(token_id)
}
