//! Playback relay interface.
//!
//! Direct video playback is often blocked by cross-origin restrictions;
//! the relay works around them by proxying the stream bytes. From the
//! pipeline's perspective it is an opaque URL rewriter, nothing more.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Rewrites a direct stream URL into one the player can actually fetch.
pub trait PlaybackRelay: Send + Sync {
    /// Returns the playable URL for `url`, optionally carrying upstream
    /// request headers the relay should attach.
    fn rewrite_for_playback(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
    ) -> String;
}

/// Relay that targets the byte-range proxy endpoint.
///
/// Produces `{base}?url=<encoded>` with an optional `h` parameter holding
/// the extra headers as base64-encoded JSON, the layout the relay
/// endpoint decodes.
#[derive(Debug, Clone)]
pub struct ProxyRelay {
    base_path: String,
}

impl ProxyRelay {
    /// Creates a relay rewriting against `base_path`, e.g. `/relay`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Default for ProxyRelay {
    fn default() -> Self {
        Self::new("/relay")
    }
}

impl PlaybackRelay for ProxyRelay {
    fn rewrite_for_playback(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
    ) -> String {
        let mut rewritten = format!("{}?url={}", self.base_path, urlencoding::encode(url));
        if let Some(headers) = headers
            && !headers.is_empty()
            && let Ok(json) = serde_json::to_string(headers)
        {
            rewritten.push_str("&h=");
            rewritten.push_str(&BASE64.encode(json));
        }
        rewritten
    }
}
