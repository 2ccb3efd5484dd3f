//! HTTP provider client backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::StreamProvider;
use crate::config::{NetworkConfig, UpstreamConfig};
use crate::errors::ProviderError;
use crate::types::{StreamSource, TitleId};

/// Provider client that queries an upstream HTTP API for stream sources.
///
/// The upstream convention is `GET {base}/streams?movieId=<id>` with an
/// optional bearer token. The response may be a bare JSON array of sources
/// or an object wrapping a `sources` field; both normalize identically.
#[derive(Debug)]
pub struct HttpProvider {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

/// Both payload shapes the upstream contract allows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamPayload {
    Wrapped { sources: Vec<RawSource> },
    Bare(Vec<RawSource>),
}

impl UpstreamPayload {
    fn into_sources(self) -> Vec<RawSource> {
        match self {
            Self::Wrapped { sources } => sources,
            Self::Bare(sources) => sources,
        }
    }
}

/// A single source record as the upstream sends it.
///
/// Upstreams label the originating service either `provider` or `name`,
/// and may omit the quality entirely.
#[derive(Debug, Deserialize)]
struct RawSource {
    url: String,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl HttpProvider {
    /// Creates a provider client for one configured upstream.
    ///
    /// # Errors
    /// - `ProviderError::Network` - the HTTP client could not be built
    pub fn from_config(
        upstream: &UpstreamConfig,
        network: &NetworkConfig,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(network.user_agent)
            .timeout(network.provider_timeout)
            .build()
            .map_err(|e| ProviderError::Network {
                provider: upstream.name.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            name: upstream.name.clone(),
            base_url: upstream.api_url.trim_end_matches('/').to_string(),
            api_key: upstream.api_key.clone(),
            timeout: network.provider_timeout,
        })
    }

    /// Normalizes raw upstream records into validated stream sources.
    ///
    /// Records without a syntactically valid absolute URL are dropped with
    /// a warning rather than failing the whole response.
    fn normalize(&self, raw: Vec<RawSource>) -> Vec<StreamSource> {
        raw.into_iter()
            .filter_map(|record| {
                let provider = record
                    .provider
                    .or(record.name)
                    .unwrap_or_else(|| self.name.clone());
                let quality = record.quality.unwrap_or_else(|| "unknown".to_string());
                match StreamSource::new(record.url.clone(), quality, provider) {
                    Ok(source) => Some(source),
                    Err(e) => {
                        tracing::warn!(
                            provider = %self.name,
                            url = %record.url,
                            error = %e,
                            "dropping source with invalid URL"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl StreamProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_sources(&self, title: &TitleId) -> Result<Vec<StreamSource>, ProviderError> {
        let url = format!(
            "{}/streams?movieId={}",
            self.base_url,
            urlencoding::encode(title.as_str())
        );

        let mut request = self.client.get(&url);
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: self.name.clone(),
                    timeout: self.timeout,
                }
            } else {
                ProviderError::Network {
                    provider: self.name.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let payload: UpstreamPayload =
            response.json().await.map_err(|e| ProviderError::Malformed {
                provider: self.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(self.normalize(payload.into_sources()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, UpstreamConfig};

    fn test_provider() -> HttpProvider {
        let upstream = UpstreamConfig {
            name: "Alpha".to_string(),
            api_url: "https://alpha.example/".to_string(),
            api_key: None,
        };
        HttpProvider::from_config(&upstream, &NetworkConfig::default()).unwrap()
    }

    #[test]
    fn wrapped_and_bare_payloads_normalize_identically() {
        let provider = test_provider();

        let wrapped: UpstreamPayload = serde_json::from_str(
            r#"{"sources":[{"url":"https://cdn.example/a.m3u8","quality":"1080p","provider":"Alpha"}]}"#,
        )
        .unwrap();
        let bare: UpstreamPayload = serde_json::from_str(
            r#"[{"url":"https://cdn.example/a.m3u8","quality":"1080p","provider":"Alpha"}]"#,
        )
        .unwrap();

        let from_wrapped = provider.normalize(wrapped.into_sources());
        let from_bare = provider.normalize(bare.into_sources());
        assert_eq!(from_wrapped, from_bare);
        assert_eq!(from_wrapped.len(), 1);
        assert_eq!(from_wrapped[0].quality, "1080p");
    }

    #[test]
    fn name_field_labels_the_provider_when_provider_is_absent() {
        let provider = test_provider();
        let payload: UpstreamPayload = serde_json::from_str(
            r#"[{"url":"https://cdn.example/a.m3u8","name":"MirrorNine"}]"#,
        )
        .unwrap();

        let sources = provider.normalize(payload.into_sources());
        assert_eq!(sources[0].provider, "MirrorNine");
        assert_eq!(sources[0].quality, "unknown");
    }

    #[test]
    fn records_with_invalid_urls_are_dropped() {
        let provider = test_provider();
        let payload: UpstreamPayload = serde_json::from_str(
            r#"[{"url":"/not/absolute.m3u8","quality":"720p"},
                {"url":"https://cdn.example/ok.m3u8","quality":"720p"}]"#,
        )
        .unwrap();

        let sources = provider.normalize(payload.into_sources());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://cdn.example/ok.m3u8");
        // The client's own name backfills the provider label.
        assert_eq!(sources[0].provider, "Alpha");
    }

    #[test]
    fn garbage_payload_fails_to_parse() {
        let parsed: Result<UpstreamPayload, _> = serde_json::from_str(r#"{"streams": 42}"#);
        assert!(parsed.is_err());
    }
}
