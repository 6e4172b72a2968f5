// Mirror feed waiter primitives.
//
// Messages reach the mirror feed some time after consensus. These helpers
// poll for the expected state with a timeout instead of sleeping a fixed
// amount, so they return as soon as the condition holds.

use ledger_common::{Client, TopicId, TopicMessage};
use tokio::time::{sleep, timeout, Duration};

use crate::error::StepFailure;

/// Poll the mirror feed of `topic_id` until a message with `expected`
/// contents shows up.
///
/// Returns the first matching message. Query errors are retried until the
/// timeout expires, since a freshly created topic may not be visible yet.
///
/// # Example
///
/// ```ignore
/// let message = wait_for_topic_message(
///     &client,
///     topic_id,
///     "Vehicle id 1234",
///     Duration::from_secs(10),
///     Duration::from_millis(100),
/// )
/// .await?;
/// ```
pub async fn wait_for_topic_message(
    client: &Client,
    topic_id: TopicId,
    expected: &str,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> Result<TopicMessage, StepFailure> {
    timeout(timeout_duration, async {
        let mut after = 0;
        loop {
            match client.topic_messages(&topic_id, after).await {
                Ok(messages) => {
                    for message in messages {
                        after = after.max(message.sequence_number);
                        let contents = message.contents_str();
                        println!("Received message: {}", contents);
                        if contents == expected {
                            return message;
                        }
                    }
                }
                Err(err) => {
                    if log::log_enabled!(log::Level::Debug) {
                        log::debug!("Mirror query for {} failed, retrying: {}", topic_id, err);
                    }
                }
            }
            sleep(poll_interval).await;
        }
    })
    .await
    .map_err(|_| {
        StepFailure::Timeout(format!(
            "Timeout waiting for message {:?} on topic {} after {:?}",
            expected, topic_id, timeout_duration
        ))
    })
}

/// Poll until the mirror feed of `topic_id` has reached `sequence_number`.
pub async fn wait_for_topic_sequence(
    client: &Client,
    topic_id: TopicId,
    sequence_number: u64,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> Result<(), StepFailure> {
    timeout(timeout_duration, async {
        loop {
            if let Ok(messages) = client
                .topic_messages(&topic_id, sequence_number.saturating_sub(1))
                .await
            {
                if messages
                    .iter()
                    .any(|message| message.sequence_number >= sequence_number)
                {
                    return;
                }
            }
            sleep(poll_interval).await;
        }
    })
    .await
    .map_err(|_| {
        StepFailure::Timeout(format!(
            "Timeout waiting for sequence number {} on topic {} after {:?}",
            sequence_number, topic_id, timeout_duration
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::SimulatedNetwork;
    use crate::orchestrator::{Clock, PausedClock};
    use ledger_common::{AccountId, Hbar, PrivateKey, Transaction, TransactionBody};
    use std::sync::Arc;

    async fn topic_with_message(
        mirror_lag: Duration,
        message: &str,
    ) -> (Client, TopicId, Arc<PausedClock>) {
        let key = PrivateKey::generate();
        let clock = Arc::new(PausedClock);
        let network = Arc::new(
            SimulatedNetwork::builder()
                .with_clock(clock.clone())
                .with_mirror_lag(mirror_lag)
                .with_account(AccountId::new(1001), key.public_key(), Hbar::new(100))
                .build(),
        );
        let client = Client::new(network).with_operator(AccountId::new(1001), key);
        let topic_id = client
            .execute_and_confirm(Transaction::new(TransactionBody::TopicCreate {
                memo: String::new(),
                submit_key: None,
            }))
            .await
            .unwrap()
            .topic_id
            .unwrap();
        client
            .execute_and_confirm(Transaction::new(TransactionBody::TopicMessageSubmit {
                topic_id,
                message: message.as_bytes().to_vec(),
            }))
            .await
            .unwrap();
        (client, topic_id, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_out_mirror_lag() {
        let (client, topic_id, clock) =
            topic_with_message(Duration::from_millis(1500), "Vehicle id 1234").await;
        let start = clock.now();

        let message = wait_for_topic_message(
            &client,
            topic_id,
            "Vehicle id 1234",
            Duration::from_secs(10),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert_eq!(message.sequence_number, 1);
        assert!(clock.now() - start >= Duration::from_millis(1500));
        assert!(clock.now() - start < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_on_wrong_contents() {
        let (client, topic_id, _clock) =
            topic_with_message(Duration::from_millis(100), "something else").await;

        let err = wait_for_topic_message(
            &client,
            topic_id,
            "Vehicle id 1234",
            Duration::from_secs(1),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("Timeout waiting for message"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_sequence() {
        let (client, topic_id, _clock) =
            topic_with_message(Duration::from_millis(500), "hello").await;

        wait_for_topic_sequence(
            &client,
            topic_id,
            1,
            Duration::from_secs(2),
            Duration::from_millis(100),
        )
        .await
        .unwrap();
    }
}
