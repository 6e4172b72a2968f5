#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! End-to-end runs of the bundled feature files

mod common;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use common::{test_config, test_network};
use ledger_tck::config::SuiteConfig;
use ledger_tck::error::FailureClass;
use ledger_tck::fixtures::SettlementMode;
use ledger_tck::scenarios::{parse_feature, FeatureRunner, StepStatus};
use tempfile::NamedTempFile;

fn feature_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/features/consensus-service.feature"
        )),
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/features/token-service.feature"
        )),
    ]
}

fn runner(config: Arc<SuiteConfig>) -> FeatureRunner {
    let network = test_network(&config);
    FeatureRunner::new(network, config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_bundled_features_pass() {
    let report = runner(test_config())
        .run_files(&feature_files())
        .await
        .unwrap();

    for scenario in report.scenarios() {
        assert!(
            scenario.passed(),
            "scenario '{}' failed: {:?}",
            scenario.name,
            scenario.first_failure()
        );
    }
    assert_eq!(report.total(), 7);
    assert_eq!(report.passed(), 7);
    assert!(report.all_passed());
}

#[tokio::test(start_paused = true)]
async fn test_rerun_on_same_ledger() {
    let runner = runner(test_config());

    let first = runner.run_files(&feature_files()).await.unwrap();
    let second = runner.run_files(&feature_files()).await.unwrap();

    assert!(first.all_passed());
    assert!(second.all_passed());
}

#[tokio::test(start_paused = true)]
async fn test_independent_settlement_passes() {
    let mut config = SuiteConfig::generated(5, 1000);
    config.settlement_mode = SettlementMode::Independent;

    let report = runner(Arc::new(config))
        .run_files(&feature_files())
        .await
        .unwrap();
    assert!(report.all_passed());
}

#[tokio::test(start_paused = true)]
async fn test_tag_filter() {
    let multi_party = runner(test_config())
        .with_tags(["@multi-party"])
        .run_files(&feature_files())
        .await
        .unwrap();
    assert_eq!(multi_party.total(), 1);
    assert!(multi_party.all_passed());

    // Feature tags are inherited by every scenario
    let consensus = runner(test_config())
        .with_tags(["consensus"])
        .run_files(&feature_files())
        .await
        .unwrap();
    assert_eq!(consensus.total(), 2);
    assert!(consensus
        .scenarios()
        .all(|scenario| scenario.tags.contains(&"consensus".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_failed_step_skips_the_rest() {
    let feature = parse_feature(
        r#"
Feature: Failures
  Scenario: Wrong supply
    Given A Hedera account with more than 10 hbar
    When I create a fixed supply token named Test Token (HTT) with 1000 tokens
    Then The total supply of the token is 999
    And An attempt to mint tokens fails
"#,
    )
    .unwrap();

    let report = runner(test_config()).run_feature(&feature, None).await;
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed());

    let statuses: Vec<&StepStatus> = scenario.steps.iter().map(|step| &step.status).collect();
    assert_eq!(statuses[0], &StepStatus::Passed);
    assert_eq!(statuses[1], &StepStatus::Passed);
    match statuses[2] {
        StepStatus::Failed { class, message } => {
            assert_eq!(*class, FailureClass::Assertion);
            assert!(message.contains("999"), "{}", message);
        }
        other => panic!("expected a failed step, got {:?}", other),
    }
    assert_eq!(statuses[3], &StepStatus::Skipped);
    assert_eq!(scenario.first_failure().unwrap().line, 6);
}

#[tokio::test(start_paused = true)]
async fn test_missing_context_is_classified() {
    let feature = parse_feature(
        r#"
Feature: Out of order
  Scenario: No token yet
    Then The token has 2 decimals
"#,
    )
    .unwrap();

    let report = runner(test_config()).run_feature(&feature, None).await;
    match &report.scenarios[0].steps[0].status {
        StepStatus::Failed { class, .. } => assert_eq!(*class, FailureClass::MissingContext),
        other => panic!("expected a failed step, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_undefined_step() {
    let text = r#"
Feature: Unknown
  Scenario: Nobody defined this
    Given A Hedera account with more than 10 hbar
    When the ledger is asked nicely
"#;

    let feature = parse_feature(text).unwrap();
    let report = runner(test_config()).run_feature(&feature, None).await;
    assert!(matches!(
        report.scenarios[0].steps[1].status,
        StepStatus::Undefined { .. }
    ));

    // Whole-file runs refuse to start with unresolved steps
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let err = runner(test_config())
        .run_files(&[file.path().to_path_buf()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unresolved"), "{}", err);
}

#[tokio::test(start_paused = true)]
async fn test_report_json() {
    let report = runner(test_config())
        .with_tags(["single-key"])
        .run_files(&feature_files())
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
    let steps = &json["features"][0]["scenarios"][0]["steps"];
    assert_eq!(steps.as_array().unwrap().len(), 4);
    assert_eq!(steps[0]["status"], "passed");
    assert_eq!(steps[0]["keyword"], "Given");
}

/// Text and class of the first failed step of the only scenario.
async fn first_failure(config: Arc<SuiteConfig>, text: &str) -> (String, FailureClass) {
    let feature = parse_feature(text).unwrap();
    let report = runner(config).run_feature(&feature, None).await;
    let scenario = &report.scenarios[0];
    let failed = scenario.first_failure().expect("scenario should fail");
    match &failed.status {
        StepStatus::Failed { class, .. } => (failed.text.clone(), *class),
        other => panic!("expected a failed step, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_holds_check_fails_without_transfer() {
    let (step, class) = first_failure(
        test_config(),
        r#"
Feature: Missing transfer
  Scenario: Nothing was sent
    Given A first hedera account with more than 10 hbar
    And A second Hedera account
    And A token named Test Token (HTT) with 500 tokens
    And The first account holds 100 HTT tokens
    And The second account holds 100 HTT tokens
    Then The second account holds 110 HTT tokens
"#,
    )
    .await;

    assert_eq!(step, "The second account holds 110 HTT tokens");
    assert_eq!(class, FailureClass::Assertion);
}

#[tokio::test(start_paused = true)]
async fn test_holds_check_after_transfer_only_reads() {
    let (step, class) = first_failure(
        test_config(),
        r#"
Feature: Short transfer
  Scenario: Receiver expects more than was sent
    Given A first hedera account with more than 10 hbar
    And A second Hedera account
    And A token named Test Token (HTT) with 500 tokens
    And The first account holds 100 HTT tokens
    And The second account holds 100 HTT tokens
    When The first account creates a transaction to transfer 10 HTT tokens to the second account
    And The first account submits the transaction
    Then The second account holds 120 HTT tokens
"#,
    )
    .await;

    assert_eq!(step, "The second account holds 120 HTT tokens");
    assert_eq!(class, FailureClass::Assertion);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_leg_fails_receiver_check() {
    let mut config = SuiteConfig::generated(5, 1000);
    config.settlement_mode = SettlementMode::Independent;

    let (step, class) = first_failure(
        Arc::new(config),
        r#"
Feature: Partial settlement
  Scenario: First debit is skipped
    Given A token named Test Token (HTT) with 1000 tokens
    And A first hedera account with more than 10 hbar and 10 HTT tokens
    And A second Hedera account with 0 hbar and 100 HTT tokens
    And A third Hedera account with 0 hbar and 0 HTT tokens
    And A fourth Hedera account with 0 hbar and 0 HTT tokens
    When A transaction is created to transfer 10 HTT tokens out of the first and second account and 5 HTT tokens into the third account and 15 HTT tokens into the fourth account
    And The first account has submitted the transaction
    Then The third account holds 5 HTT tokens
    And The fourth account holds 15 HTT tokens
"#,
    )
    .await;

    assert_eq!(step, "The third account holds 5 HTT tokens");
    assert_eq!(class, FailureClass::Assertion);
}

#[tokio::test(start_paused = true)]
async fn test_unfunded_holder_fails_setup() {
    let (step, class) = first_failure(
        test_config(),
        r#"
Feature: Treasury too small
  Scenario: Holder cannot be funded
    Given A token named Test Token (HTT) with 50 tokens
    And A first hedera account with more than 10 hbar and 100 HTT tokens
"#,
    )
    .await;

    assert_eq!(
        step,
        "A first hedera account with more than 10 hbar and 100 HTT tokens"
    );
    assert_eq!(class, FailureClass::Assertion);
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_multi_party_amount_is_rejected() {
    let (step, class) = first_failure(
        test_config(),
        r#"
Feature: Huge transfer
  Scenario: Debits overflow
    Given A token named Test Token (HTT) with 1000 tokens
    When A transaction is created to transfer 18446744073709551615 HTT tokens out of the first and second account and 5 HTT tokens into the third account and 15 HTT tokens into the fourth account
"#,
    )
    .await;

    assert!(step.starts_with("A transaction is created"), "{}", step);
    assert_eq!(class, FailureClass::Fixture);
}
