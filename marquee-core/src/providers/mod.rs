//! Provider client implementations for stream discovery.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::types::{StreamSource, TitleId};

pub mod http;
pub mod mock;

pub use http::HttpProvider;
pub use mock::MockProvider;

/// A client for one upstream provider service.
///
/// Implementations query a single upstream for playable stream URLs and
/// normalize its response. They never retry internally; retry policy
/// belongs to the aggregator.
#[async_trait]
pub trait StreamProvider: Send + Sync + std::fmt::Debug {
    /// Display name of this provider, used for labels and filtering.
    fn name(&self) -> &str;

    /// Fetches all stream sources the provider knows for `title`.
    ///
    /// # Errors
    /// - `ProviderError::Upstream` - non-success status from the upstream
    /// - `ProviderError::Timeout` - no response within the bounded window
    /// - `ProviderError::Malformed` - payload could not be parsed
    /// - `ProviderError::Network` - transport-level failure
    async fn fetch_sources(&self, title: &TitleId) -> Result<Vec<StreamSource>, ProviderError>;
}
