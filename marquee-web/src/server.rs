//! HTTP server wiring for the stream resolution API.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use marquee_core::aggregator::StreamAggregator;
use marquee_core::cache::ResultCache;
use marquee_core::config::MarqueeConfig;
use marquee_core::delivery::DeliveryChannel;
use tower_http::cors::CorsLayer;

use crate::handlers::{bulk_streams, health, progressive_streams};
use crate::relay::relay_stream;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Fan-out aggregator over the configured providers.
    pub aggregator: Arc<StreamAggregator>,
    /// Process-wide result cache.
    pub cache: Arc<ResultCache>,
    /// Delivery channel feeding the progressive endpoint.
    pub channel: DeliveryChannel,
    /// Client used by the relay endpoint to fetch upstream bytes.
    pub relay_client: reqwest::Client,
    /// Server start time, reported by the health probe.
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// # Errors
    /// - `marquee_core::ProviderError` - a provider HTTP client could not
    ///   be built
    pub fn from_config(config: &MarqueeConfig) -> Result<Self, marquee_core::ProviderError> {
        let aggregator = Arc::new(StreamAggregator::from_config(config)?);
        let cache = Arc::new(ResultCache::new(config.cache.ttl));
        let channel = DeliveryChannel::new(Arc::clone(&aggregator), Arc::clone(&cache));
        Ok(Self {
            aggregator,
            cache,
            channel,
            relay_client: reqwest::Client::new(),
            started_at: Instant::now(),
        })
    }
}

/// Builds the API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/streams", get(bulk_streams))
        .route("/streams/progressive", get(progressive_streams))
        .route("/relay", get(relay_stream))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until the listener fails.
///
/// # Errors
/// Returns any bind or serve error from the underlying listener.
pub async fn run_server(config: MarqueeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.server.bind;
    let state = AppState::from_config(&config)?;
    let app = router(state);

    tracing::info!(
        %bind,
        providers = config.providers.upstreams.len(),
        "marquee stream server listening"
    );
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
