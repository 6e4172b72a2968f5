//! Consensus service steps: topics, threshold submit keys and messages.

use ledger_common::{Key, KeyList, Transaction, TransactionBody};

use crate::ensure_step;
use crate::error::StepFailure;
use crate::scenarios::{StepArgs, StepFuture, StepRegistry, World};
use crate::waiters::wait_for_topic_message;

use super::ensure_hbar_above;

/// Transaction memo attached to published messages.
const MESSAGE_MEMO: &str = "Taxi rides";

pub(super) fn register(registry: &mut StepRegistry) -> Result<(), regex_lite::Error> {
    registry.register(r"a first account with more than (\d+) hbars", first_account)?;
    registry.register(r"A second account with more than (\d+) hbars", second_account)?;
    registry.register(
        r#"A topic is created with the memo "([^"]*)" with the first account as the submit key"#,
        topic_with_first_account_key,
    )?;
    registry.register(
        r"A (\d+) of (\d+) threshold key with the first and second account",
        threshold_key,
    )?;
    registry.register(
        r#"A topic is created with the memo "([^"]*)" with the threshold key as the submit key"#,
        topic_with_threshold_key,
    )?;
    registry.register(r#"The message "([^"]*)" is published to the topic"#, publish_message)?;
    registry.register(
        r#"The message "([^"]*)" is received by the topic and can be printed to the console"#,
        message_received,
    )?;
    Ok(())
}

fn first_account(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let hbars: i64 = args.get(0)?;
        let account = world.use_operator(0)?;
        ensure_hbar_above(world, &account, hbars).await
    })
}

fn second_account(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let hbars: i64 = args.get(0)?;
        let account = world.use_operator(1)?;
        ensure_hbar_above(world, &account, hbars).await
    })
}

fn topic_with_first_account_key(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let memo = args.str(0)?.to_string();
        let key = world.account(0)?.public_key();
        create_topic(world, memo, Key::Single(key)).await
    })
}

fn threshold_key(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let threshold: u32 = args.get(0)?;
        let total: usize = args.get(1)?;
        let keys = [world.account(0)?.public_key(), world.account(1)?.public_key()];
        if total != keys.len() {
            return Err(StepFailure::InvalidArgument(format!(
                "Threshold key over the first and second account has {} members, not {}",
                keys.len(),
                total
            )));
        }
        if threshold == 0 || threshold as usize > total {
            return Err(StepFailure::InvalidArgument(format!(
                "Threshold {} is not within 1..={}",
                threshold, total
            )));
        }

        let key = KeyList::threshold(keys, threshold);
        if log::log_enabled!(log::Level::Info) {
            log::info!("Created {} of {} threshold key: {}", threshold, total, key);
        }
        world.context.set_threshold_key(key);
        Ok(())
    })
}

fn topic_with_threshold_key(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let memo = args.str(0)?.to_string();
        let key = world.context.threshold_key()?.clone();
        create_topic(world, memo, Key::List(key)).await
    })
}

async fn create_topic(world: &mut World, memo: String, submit_key: Key) -> Result<(), StepFailure> {
    let receipt = world
        .client
        .execute_and_confirm(Transaction::new(TransactionBody::TopicCreate {
            memo: memo.clone(),
            submit_key: Some(submit_key),
        }))
        .await?;
    let topic_id = receipt
        .topic_id
        .ok_or_else(|| StepFailure::Assertion("Receipt carries no topic id".to_string()))?;
    world.context.set_topic_id(topic_id)?;
    world.context.set_last_transaction_id(receipt.transaction_id);
    if log::log_enabled!(log::Level::Info) {
        log::info!("Created topic with ID: {}", topic_id);
    }

    let info = world.client.topic_info(&topic_id).await?;
    ensure_step!(
        info.memo == memo,
        "Topic memo is {:?}, expected {:?}",
        info.memo,
        memo
    );
    Ok(())
}

fn publish_message(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let message = args.str(0)?;
        let topic_id = world.context.topic_id()?;
        let transaction = Transaction::new(TransactionBody::TopicMessageSubmit {
            topic_id,
            message: message.as_bytes().to_vec(),
        })
        .with_memo(MESSAGE_MEMO);

        let receipt = world.client.execute_and_confirm(transaction).await?;
        world.context.set_last_transaction_id(receipt.transaction_id);
        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Published message to topic {} in transaction {} (sequence {:?})",
                topic_id,
                receipt.transaction_id,
                receipt.topic_sequence_number
            );
        }
        Ok(())
    })
}

fn message_received(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.str(0)?;
        let topic_id = world.context.topic_id()?;
        let message = wait_for_topic_message(
            &world.client,
            topic_id,
            expected,
            world.config.mirror_timeout(),
            world.config.poll_interval(),
        )
        .await?;
        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "Message {:?} found in topic {} at sequence {}",
                expected,
                topic_id,
                message.sequence_number
            );
        }
        Ok(())
    })
}
