//! Payment confirmation watching.
//!
//! A marketplace operation is only settled once its payment transaction
//! surfaces on chain and confirms. The watcher polls for a payment
//! matching the operation's tags; a payment that has not appeared within
//! [`MIN_CONFIRMATIONS`] blocks of the watch start is treated as dropped
//! by the network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use permaflow_protocol::constants::{
    APP_NAME, APP_VERSION, MIN_CONFIRMATIONS, WATCH_POLL_INTERVAL, tag_names,
};
use permaflow_protocol::messages::WatchTxRequest;
use permaflow_protocol::types::Tag;

use crate::JobError;

/// Tuning for a watch loop.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub min_confirmations: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: WATCH_POLL_INTERVAL,
            min_confirmations: MIN_CONFIRMATIONS,
        }
    }
}

/// Result of a completed watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A matching payment exists and is confirmed.
    Confirmed { payment_tx: String },
    /// No payment surfaced within the confirmation window.
    Lost,
}

/// Chain gateway used by the watcher.
///
/// The GraphQL transport, indexing, and confirmation bookkeeping behind
/// these calls are out of scope; tests script them.
pub trait ChainQuery: Send + Sync {
    /// Current network block height.
    fn current_height(&self) -> Pin<Box<dyn Future<Output = Result<u64, JobError>> + Send + '_>>;

    /// Id of the first transaction from `address` carrying all `tags`,
    /// if any exists.
    fn find_payment<'a>(
        &'a self,
        address: &'a str,
        tags: &'a [Tag],
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, JobError>> + Send + 'a>>;

    /// Whether `tx_id` has reached confirmed depth.
    fn is_confirmed<'a>(
        &'a self,
        tx_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, JobError>> + Send + 'a>>;
}

/// Tags a payment for `request`'s operation must carry.
pub fn payment_query_tags(request: &WatchTxRequest) -> Vec<Tag> {
    vec![
        Tag::new(tag_names::APP_NAME, APP_NAME),
        Tag::new(tag_names::APP_VERSION, APP_VERSION),
        Tag::new(
            tag_names::OPERATION_NAME,
            request.operation.payment_operation(),
        ),
        Tag::new(request.operation.reference_tag(), &request.tx_id),
    ]
}

/// Polls the chain until the payment for `request` confirms or the
/// confirmation window closes.
///
/// A payment that exists but has not confirmed yet keeps the watch alive
/// past the window; only a payment that never surfaces is declared lost.
pub async fn watch<Q: ChainQuery + ?Sized>(
    query: &Q,
    request: &WatchTxRequest,
    config: &WatchConfig,
) -> Result<WatchOutcome, JobError> {
    let tags = payment_query_tags(request);
    let start_height = query.current_height().await?;
    debug!(tx = %request.tx_id, start_height, "watching for payment");

    loop {
        match query.find_payment(&request.address, &tags).await? {
            Some(payment_tx) => {
                if query.is_confirmed(&payment_tx).await? {
                    return Ok(WatchOutcome::Confirmed { payment_tx });
                }
            }
            None => {
                let height = query.current_height().await?;
                if height > start_height + config.min_confirmations {
                    return Ok(WatchOutcome::Lost);
                }
            }
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use permaflow_protocol::types::OperationKind;

    use super::*;

    fn request() -> WatchTxRequest {
        WatchTxRequest {
            tx_id: "tx-1".into(),
            operation: OperationKind::InferenceRequest,
            address: "addr-1".into(),
            tags: Vec::new(),
        }
    }

    fn config() -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_millis(10),
            min_confirmations: 3,
        }
    }

    /// Scripted chain: height advances by one per query; payment
    /// discovery and confirmation follow per-call scripts.
    struct MockChain {
        height: Mutex<u64>,
        payments: Mutex<Vec<Option<String>>>,
        confirmations: Mutex<Vec<bool>>,
        seen_tags: Mutex<Vec<Vec<Tag>>>,
    }

    impl MockChain {
        fn new(payments: Vec<Option<String>>, confirmations: Vec<bool>) -> Self {
            Self {
                height: Mutex::new(100),
                payments: Mutex::new(payments),
                confirmations: Mutex::new(confirmations),
                seen_tags: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChainQuery for MockChain {
        fn current_height(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<u64, JobError>> + Send + '_>> {
            Box::pin(async move {
                let mut h = self.height.lock().unwrap();
                *h += 1;
                Ok(*h)
            })
        }

        fn find_payment<'a>(
            &'a self,
            _address: &'a str,
            tags: &'a [Tag],
        ) -> Pin<Box<dyn Future<Output = Result<Option<String>, JobError>> + Send + 'a>>
        {
            Box::pin(async move {
                self.seen_tags.lock().unwrap().push(tags.to_vec());
                let mut payments = self.payments.lock().unwrap();
                if payments.is_empty() {
                    Ok(None)
                } else {
                    Ok(payments.remove(0))
                }
            })
        }

        fn is_confirmed<'a>(
            &'a self,
            _tx_id: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<bool, JobError>> + Send + 'a>> {
            Box::pin(async move {
                let mut confirmations = self.confirmations.lock().unwrap();
                if confirmations.is_empty() {
                    Ok(true)
                } else {
                    Ok(confirmations.remove(0))
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_payment_ends_watch() {
        let chain = MockChain::new(vec![Some("pay-1".into())], vec![true]);
        let outcome = watch(&chain, &request(), &config()).await.unwrap();
        assert_eq!(
            outcome,
            WatchOutcome::Confirmed {
                payment_tx: "pay-1".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_payment_keeps_polling() {
        let chain = MockChain::new(
            vec![Some("pay-1".into()), Some("pay-1".into())],
            vec![false, true],
        );
        let outcome = watch(&chain, &request(), &config()).await.unwrap();
        assert_eq!(
            outcome,
            WatchOutcome::Confirmed {
                payment_tx: "pay-1".into()
            }
        );
        // Two discovery rounds happened.
        assert_eq!(chain.seen_tags.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_payment_is_lost_after_window() {
        // Payments never appear; height climbs one block per poll.
        let chain = MockChain::new(Vec::new(), Vec::new());
        let outcome = watch(&chain, &request(), &config()).await.unwrap();
        assert_eq!(outcome, WatchOutcome::Lost);

        // Polled until the height passed start + min_confirmations.
        let rounds = chain.seen_tags.lock().unwrap().len();
        assert!(rounds >= 3, "expected at least 3 polls, got {rounds}");
    }

    #[tokio::test(start_paused = true)]
    async fn payment_query_carries_operation_mapping() {
        let chain = MockChain::new(vec![Some("pay-1".into())], vec![true]);
        watch(&chain, &request(), &config()).await.unwrap();

        let seen = chain.seen_tags.lock().unwrap();
        let tags = &seen[0];
        assert!(
            tags.contains(&Tag::new(tag_names::OPERATION_NAME, "Inference Payment"))
        );
        assert!(tags.contains(&Tag::new(tag_names::INFERENCE_TRANSACTION, "tx-1")));
        assert!(tags.contains(&Tag::new(tag_names::APP_NAME, APP_NAME)));
    }
}
