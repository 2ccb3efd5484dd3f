//! Data types shared across the stream resolution pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::InvalidTitle;

/// A single playable stream discovered for a title.
///
/// Immutable once produced. The `quality` and `provider` labels are
/// free-form and used only for display and filtering; correctness never
/// depends on them. Best-effort deduplication within one aggregation run
/// keys on the `(provider, url)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    /// Absolute URL of the playable stream.
    pub url: String,
    /// Display quality label, e.g. "1080p".
    pub quality: String,
    /// Name of the provider that supplied this source.
    pub provider: String,
}

impl StreamSource {
    /// Builds a source after checking that `url` parses as an absolute URL.
    ///
    /// # Errors
    /// - `url::ParseError` - `url` is relative or not a valid URL
    pub fn new(
        url: impl Into<String>,
        quality: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let url = url.into();
        Url::parse(&url)?;
        Ok(Self {
            url,
            quality: quality.into(),
            provider: provider.into(),
        })
    }

    /// Key used for best-effort deduplication within one aggregation run.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.provider, &self.url)
    }
}

/// Opaque identifier of the work being resolved.
///
/// Supplied by the caller and passed through unmodified to provider
/// queries. Only "non-empty" is validated; upstream contracts that require
/// numeric identifiers must enforce that themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleId(String);

impl TitleId {
    /// Parses a title identifier, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    /// - `InvalidTitle` - the identifier is empty after trimming
    pub fn parse(raw: &str) -> Result<Self, InvalidTitle> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidTitle);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_source_requires_absolute_url() {
        assert!(StreamSource::new("https://cdn.example/x.m3u8", "1080p", "A").is_ok());
        assert!(StreamSource::new("/relative/path.m3u8", "1080p", "A").is_err());
        assert!(StreamSource::new("not a url", "1080p", "A").is_err());
    }

    #[test]
    fn title_id_rejects_empty_input() {
        assert!(TitleId::parse("").is_err());
        assert!(TitleId::parse("   ").is_err());
        assert_eq!(TitleId::parse("550").unwrap().as_str(), "550");
        // Opaque string identifiers are accepted, not just numeric ones.
        assert!(TitleId::parse("tt0137523").is_ok());
    }

    #[test]
    fn title_id_trims_surrounding_whitespace() {
        assert_eq!(TitleId::parse(" 550 ").unwrap().as_str(), "550");
    }
}
