//! Centralized configuration for Marquee.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the codebase. Provider credentials can be
//! overridden through environment variables for deployments.

use std::net::SocketAddr;
use std::time::Duration;

/// Central configuration for all Marquee components.
///
/// Groups related settings into logical sections. Constructed once at
/// process start and handed to the components that need it.
#[derive(Debug, Clone, Default)]
pub struct MarqueeConfig {
    /// Upstream provider endpoints to aggregate over.
    pub providers: ProvidersConfig,
    /// HTTP client behavior.
    pub network: NetworkConfig,
    /// Result cache behavior.
    pub cache: CacheConfig,
    /// HTTP server behavior.
    pub server: ServerConfig,
}

impl MarqueeConfig {
    /// Builds a configuration from defaults plus environment overrides.
    ///
    /// Recognized variables: `PROVIDER_NAME`, `PROVIDER_API_URL` and
    /// `PROVIDER_API_KEY` override the single default upstream entry.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(upstream) = config.providers.upstreams.first_mut() {
            if let Ok(name) = std::env::var("PROVIDER_NAME") {
                upstream.name = name;
            }
            if let Ok(api_url) = std::env::var("PROVIDER_API_URL") {
                upstream.api_url = api_url;
            }
            if let Ok(api_key) = std::env::var("PROVIDER_API_KEY")
                && !api_key.is_empty()
            {
                upstream.api_key = Some(api_key);
            }
        }
        config
    }
}

/// The set of upstream provider services to query.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// One entry per upstream provider endpoint.
    pub upstreams: Vec<UpstreamConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            upstreams: vec![UpstreamConfig::default()],
        }
    }
}

/// A single upstream provider endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Display name of the provider.
    pub name: String,
    /// Base URL of the provider API.
    pub api_url: String,
    /// Optional bearer token for the provider API.
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            name: "DefaultProvider".to_string(),
            api_url: "https://api.example.com".to_string(),
            api_key: None,
        }
    }
}

/// HTTP client communication settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Per-request timeout for provider calls
    pub provider_timeout: Duration,
    /// User agent for outgoing HTTP requests
    pub user_agent: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            user_agent: concat!("marquee/", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached aggregation result stays fresh.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}
