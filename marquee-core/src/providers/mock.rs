//! Scripted provider for tests and development.

use std::time::Duration;

use async_trait::async_trait;

use super::StreamProvider;
use crate::errors::ProviderError;
use crate::types::{StreamSource, TitleId};

/// Provider that replays a scripted response after an optional delay.
///
/// Used to exercise aggregation ordering, failure isolation and timeout
/// behavior without touching the network.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    delay: Option<Duration>,
    response: MockResponse,
}

#[derive(Debug)]
enum MockResponse {
    Sources(Vec<StreamSource>),
    Upstream(u16),
    Hang,
    Panic,
}

impl MockProvider {
    /// A provider that resolves with the given sources.
    pub fn succeeding(name: &str, sources: Vec<StreamSource>) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            response: MockResponse::Sources(sources),
        }
    }

    /// A provider that fails with an upstream HTTP status.
    pub fn failing(name: &str, status: u16) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            response: MockResponse::Upstream(status),
        }
    }

    /// A provider that never answers, to exercise the timeout path.
    pub fn hanging(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            response: MockResponse::Hang,
        }
    }

    /// A provider that panics instead of answering, to exercise the
    /// interrupted-aggregation path.
    pub fn panicking(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            response: MockResponse::Panic,
        }
    }

    /// Delays the scripted response by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Convenience constructor for a single-source provider.
    ///
    /// # Panics
    /// Panics if `url` is not an absolute URL; mock scripts are
    /// test-authored constants.
    pub fn single(name: &str, url: &str, quality: &str) -> Self {
        let source = StreamSource::new(url, quality, name)
            .expect("mock source URL must be absolute");
        Self::succeeding(name, vec![source])
    }
}

#[async_trait]
impl StreamProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_sources(&self, _title: &TitleId) -> Result<Vec<StreamSource>, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            MockResponse::Sources(sources) => Ok(sources.clone()),
            MockResponse::Upstream(status) => Err(ProviderError::Upstream {
                provider: self.name.clone(),
                status: *status,
            }),
            MockResponse::Hang => {
                // Sleeps far beyond any test timeout; the aggregator's
                // timeout fires first.
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            MockResponse::Panic => panic!("scripted provider panic"),
        }
    }
}
