//! Fan-out aggregation of stream sources across providers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::{mpsc, oneshot};

use crate::config::MarqueeConfig;
use crate::errors::{AggregateError, ProviderError};
use crate::providers::{HttpProvider, StreamProvider};
use crate::types::{StreamSource, TitleId};

/// Capacity of the progressive source channel.
const SOURCE_CHANNEL_CAPACITY: usize = 32;

/// Orchestrates the configured provider clients for one title lookup.
///
/// Providers are queried in parallel and their sources emitted in
/// first-resolved-first-emitted order. A single provider's failure never
/// aborts the run; only when every provider fails does the whole
/// aggregation fail.
#[derive(Debug)]
pub struct StreamAggregator {
    providers: Vec<Arc<dyn StreamProvider>>,
    timeout: Duration,
}

/// Handle to one in-flight progressive aggregation.
///
/// `sources` yields deduplicated sources in discovery order; `outcome`
/// resolves once the run finishes, with the emitted count or the
/// all-providers-failed error. Dropping `sources` cancels the run
/// cooperatively: dispatched provider calls complete and are discarded.
#[derive(Debug)]
pub struct ProgressiveRun {
    /// Sources in discovery order, deduplicated by `(provider, url)`.
    pub sources: mpsc::Receiver<StreamSource>,
    /// Final result of the run.
    pub outcome: oneshot::Receiver<Result<usize, AggregateError>>,
}

impl StreamAggregator {
    /// Creates an aggregator over an explicit provider set.
    pub fn new(providers: Vec<Arc<dyn StreamProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Builds the aggregator from configuration, one HTTP provider client
    /// per configured upstream.
    ///
    /// # Errors
    /// - `ProviderError::Network` - an HTTP client could not be built
    pub fn from_config(config: &MarqueeConfig) -> Result<Self, ProviderError> {
        let mut providers: Vec<Arc<dyn StreamProvider>> = Vec::new();
        for upstream in &config.providers.upstreams {
            providers.push(Arc::new(HttpProvider::from_config(upstream, &config.network)?));
        }
        Ok(Self::new(providers, config.network.provider_timeout))
    }

    /// Number of configured providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Resolves all sources for `title`, waiting for every provider.
    ///
    /// Returns the deduplicated union of the successful providers'
    /// sources. Order is discovery order, which across providers is
    /// unspecified beyond first-resolved-first-emitted.
    ///
    /// # Errors
    /// - `AggregateError::AllProvidersFailed` - no provider returned
    pub async fn aggregate(&self, title: TitleId) -> Result<Vec<StreamSource>, AggregateError> {
        let attempted = self.providers.len();
        let ProgressiveRun { mut sources, outcome } = self.aggregate_progressive(title);

        let mut collected = Vec::new();
        while let Some(source) = sources.recv().await {
            collected.push(source);
        }

        match outcome.await {
            Ok(Ok(_)) => Ok(collected),
            Ok(Err(e)) => Err(e),
            // The pump task only vanishes without reporting if it was
            // aborted; treat that as a failed run.
            Err(_) => Err(AggregateError::AllProvidersFailed { attempted }),
        }
    }

    /// Starts a progressive aggregation for `title`.
    ///
    /// Each source is emitted the instant its provider resolves rather
    /// than after all providers have answered. The returned run is a
    /// lazy, finite, non-restartable sequence.
    pub fn aggregate_progressive(&self, title: TitleId) -> ProgressiveRun {
        let (source_tx, source_rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let providers = self.providers.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let result = pump_providers(providers, timeout, title, source_tx).await;
            let _ = outcome_tx.send(result);
        });

        ProgressiveRun {
            sources: source_rx,
            outcome: outcome_rx,
        }
    }
}

/// Queries every provider in parallel, forwarding deduplicated sources to
/// `source_tx` as they resolve.
async fn pump_providers(
    providers: Vec<Arc<dyn StreamProvider>>,
    timeout: Duration,
    title: TitleId,
    source_tx: mpsc::Sender<StreamSource>,
) -> Result<usize, AggregateError> {
    let attempted = providers.len();

    let mut in_flight = FuturesUnordered::new();
    for provider in providers {
        let title = title.clone();
        in_flight.push(async move {
            let name = provider.name().to_string();
            let result = match tokio::time::timeout(timeout, provider.fetch_sources(&title)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    provider: name.clone(),
                    timeout,
                }),
            };
            (name, result)
        });
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut emitted = 0usize;
    let mut failed = 0usize;

    while let Some((name, result)) = in_flight.next().await {
        match result {
            Ok(sources) => {
                for source in sources {
                    let key = (source.provider.clone(), source.url.clone());
                    if !seen.insert(key) {
                        continue;
                    }
                    emitted += 1;
                    if source_tx.send(source).await.is_err() {
                        // Consumer went away; stop pumping and let the
                        // remaining calls run to completion unobserved.
                        tracing::debug!(title = %title, "progressive consumer gone, stopping");
                        return Ok(emitted);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    provider = %name,
                    title = %title,
                    error = %e,
                    "provider failed, continuing without it"
                );
            }
        }
    }

    if attempted > 0 && failed == attempted {
        return Err(AggregateError::AllProvidersFailed { attempted });
    }
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn title() -> TitleId {
        TitleId::parse("550").unwrap()
    }

    fn arc(provider: MockProvider) -> Arc<dyn StreamProvider> {
        Arc::new(provider)
    }

    #[tokio::test]
    async fn aggregate_unions_successful_providers() {
        let aggregator = StreamAggregator::new(
            vec![
                arc(MockProvider::single("A", "https://a.example/x.m3u8", "1080p")),
                arc(MockProvider::single("B", "https://b.example/y.mp4", "720p")),
                arc(MockProvider::failing("C", 503)),
            ],
            Duration::from_secs(1),
        );

        let sources = aggregator.aggregate(title()).await.unwrap();
        assert_eq!(sources.len(), 2);
        let providers: HashSet<&str> = sources.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(providers, HashSet::from(["A", "B"]));
    }

    #[tokio::test]
    async fn aggregate_fails_only_when_every_provider_fails() {
        let aggregator = StreamAggregator::new(
            vec![
                arc(MockProvider::failing("A", 500)),
                arc(MockProvider::failing("B", 404)),
            ],
            Duration::from_secs(1),
        );

        let err = aggregator.aggregate(title()).await.unwrap_err();
        assert_eq!(err, AggregateError::AllProvidersFailed { attempted: 2 });
    }

    #[tokio::test]
    async fn duplicate_provider_url_pairs_are_emitted_once() {
        let duplicate = StreamSource::new("https://a.example/x.m3u8", "1080p", "A").unwrap();
        let aggregator = StreamAggregator::new(
            vec![
                arc(MockProvider::succeeding(
                    "A",
                    vec![duplicate.clone(), duplicate.clone()],
                )),
                arc(MockProvider::succeeding("A2", vec![duplicate.clone()])),
            ],
            Duration::from_secs(1),
        );

        let sources = aggregator.aggregate(title()).await.unwrap();
        assert_eq!(sources, vec![duplicate]);
    }

    #[tokio::test(start_paused = true)]
    async fn progressive_emits_in_first_resolved_order() {
        let aggregator = StreamAggregator::new(
            vec![
                arc(
                    MockProvider::single("Slow", "https://slow.example/s.m3u8", "1080p")
                        .with_delay(Duration::from_millis(50)),
                ),
                arc(
                    MockProvider::single("Fast", "https://fast.example/f.m3u8", "720p")
                        .with_delay(Duration::from_millis(10)),
                ),
            ],
            Duration::from_secs(1),
        );

        let ProgressiveRun { mut sources, outcome } = aggregator.aggregate_progressive(title());
        let first = sources.recv().await.unwrap();
        let second = sources.recv().await.unwrap();
        assert!(sources.recv().await.is_none());

        assert_eq!(first.provider, "Fast");
        assert_eq!(second.provider, "Slow");
        assert_eq!(outcome.await.unwrap(), Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_is_bounded_by_the_timeout() {
        let aggregator = StreamAggregator::new(
            vec![
                arc(MockProvider::single("A", "https://a.example/x.m3u8", "1080p")
                    .with_delay(Duration::from_millis(50))),
                arc(MockProvider::hanging("C")),
            ],
            Duration::from_millis(100),
        );

        let start = tokio::time::Instant::now();
        let sources = aggregator.aggregate(title()).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].provider, "A");
        // Parallel dispatch keeps the bound at one timeout period.
        assert!(start.elapsed() <= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn progressive_and_bulk_agree_on_the_source_set() {
        let providers = || {
            vec![
                arc(MockProvider::single("A", "https://a.example/x.m3u8", "1080p")),
                arc(MockProvider::succeeding(
                    "B",
                    vec![
                        StreamSource::new("https://b.example/y.mp4", "720p", "B").unwrap(),
                        StreamSource::new("https://b.example/z.mp4", "480p", "B").unwrap(),
                    ],
                )),
            ]
        };

        let bulk_aggregator = StreamAggregator::new(providers(), Duration::from_secs(1));
        let mut bulk = bulk_aggregator.aggregate(title()).await.unwrap();

        let progressive_aggregator = StreamAggregator::new(providers(), Duration::from_secs(1));
        let ProgressiveRun { mut sources, outcome } =
            progressive_aggregator.aggregate_progressive(title());
        let mut progressive = Vec::new();
        while let Some(source) = sources.recv().await {
            progressive.push(source);
        }
        assert_eq!(outcome.await.unwrap(), Ok(progressive.len()));

        let key = |s: &StreamSource| (s.provider.clone(), s.url.clone());
        bulk.sort_by_key(key);
        progressive.sort_by_key(key);
        assert_eq!(bulk, progressive);
    }

    #[tokio::test]
    async fn empty_provider_set_yields_an_empty_run() {
        let aggregator = StreamAggregator::new(Vec::new(), Duration::from_secs(1));
        let sources = aggregator.aggregate(title()).await.unwrap();
        assert!(sources.is_empty());
    }
}
