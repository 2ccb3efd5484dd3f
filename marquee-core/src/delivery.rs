//! Push-based delivery of aggregation results to a remote consumer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::aggregator::{ProgressiveRun, StreamAggregator};
use crate::cache::ResultCache;
use crate::types::{StreamSource, TitleId};

/// Capacity of the delivery event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// One frame of the delivery stream.
///
/// Every stream follows the grammar `start, source*, (complete | error)`:
/// exactly one `start`, zero or more `source` frames in discovery order,
/// then exactly one terminal frame. Nothing follows the terminal frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveryEvent {
    /// The lookup has begun.
    Start,
    /// One discovered stream source.
    Source {
        /// The discovered source.
        data: StreamSource,
    },
    /// The lookup finished; `total` counts the emitted sources.
    Complete {
        /// Number of `source` frames that were emitted.
        total: usize,
    },
    /// The lookup failed after `start`.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// Exposes progressive aggregation as an ordered event stream.
///
/// Consults the result cache before going upstream; a hit is replayed
/// through the same event grammar, and a successful upstream run is
/// written back for the next caller.
#[derive(Debug, Clone)]
pub struct DeliveryChannel {
    aggregator: Arc<StreamAggregator>,
    cache: Arc<ResultCache>,
}

impl DeliveryChannel {
    /// Creates a channel over the given aggregator and cache.
    pub fn new(aggregator: Arc<StreamAggregator>, cache: Arc<ResultCache>) -> Self {
        Self { aggregator, cache }
    }

    /// Opens the event stream for `title`.
    ///
    /// The pump runs in a spawned task; dropping the receiver cancels it
    /// at the next send, which in turn stops the underlying aggregation.
    pub fn open(&self, title: TitleId) -> mpsc::Receiver<DeliveryEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let aggregator = Arc::clone(&self.aggregator);
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            pump_events(aggregator, cache, title, tx).await;
        });

        rx
    }
}

async fn pump_events(
    aggregator: Arc<StreamAggregator>,
    cache: Arc<ResultCache>,
    title: TitleId,
    tx: mpsc::Sender<DeliveryEvent>,
) {
    if tx.send(DeliveryEvent::Start).await.is_err() {
        return;
    }

    if let Some(cached) = cache.get(&title) {
        let total = cached.len();
        for source in cached {
            if tx.send(DeliveryEvent::Source { data: source }).await.is_err() {
                return;
            }
        }
        let _ = tx.send(DeliveryEvent::Complete { total }).await;
        return;
    }

    let ProgressiveRun { mut sources, outcome } = aggregator.aggregate_progressive(title.clone());

    let mut collected = Vec::new();
    while let Some(source) = sources.recv().await {
        collected.push(source.clone());
        if tx.send(DeliveryEvent::Source { data: source }).await.is_err() {
            return;
        }
    }

    match outcome.await {
        Ok(Ok(total)) => {
            cache.put(&title, collected);
            let _ = tx.send(DeliveryEvent::Complete { total }).await;
        }
        Ok(Err(e)) => {
            let _ = tx.send(DeliveryEvent::Error { message: e.to_string() }).await;
        }
        Err(_) => {
            // Aggregation task vanished without reporting; the consumer
            // must still see a terminal frame.
            let _ = tx
                .send(DeliveryEvent::Error {
                    message: "stream aggregation was interrupted".to_string(),
                })
                .await;
        }
    }
}
