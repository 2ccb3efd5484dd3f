//! Byte-range relay endpoint.
//!
//! Streams upstream video bytes through this origin to work around
//! cross-origin restrictions on direct playback. Forwards `Range` and the
//! caller-supplied extra headers, mirrors the essential response headers
//! and otherwise stays out of the way.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{Response, StatusCode};
use axum::response::{IntoResponse, Json};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use crate::server::AppState;

/// Response headers mirrored from the upstream.
const MIRRORED_HEADERS: [&str; 5] = [
    "content-type",
    "content-length",
    "accept-ranges",
    "content-range",
    "cache-control",
];

/// Query parameters of the relay endpoint.
#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    /// Target URL to fetch.
    pub url: Option<String>,
    /// Optional extra request headers, base64-encoded JSON map.
    pub h: Option<String>,
}

/// Decodes the packed extra-headers parameter; `Host` is never forwarded.
fn decode_extra_headers(packed: &str) -> HashMap<String, String> {
    BASE64
        .decode(packed)
        .ok()
        .and_then(|raw| serde_json::from_slice::<HashMap<String, String>>(&raw).ok())
        .map(|mut headers| {
            headers.retain(|name, _| !name.eq_ignore_ascii_case("host"));
            headers
        })
        .unwrap_or_default()
}

/// `GET /relay?url=<target>&h=<b64>` - stream upstream bytes through this
/// origin.
pub async fn relay_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RelayQuery>,
) -> axum::response::Response {
    let Some(target) = query.url.filter(|url| !url.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url is required" })),
        )
            .into_response();
    };

    let mut request = state.relay_client.get(&target);
    if let Some(range) = headers.get("range") {
        request = request.header("Range", range);
    }
    if let Some(ref packed) = query.h {
        for (name, value) in decode_extra_headers(packed) {
            request = request.header(name, value);
        }
    }

    let upstream = match request.send().await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!(url = %target, error = %e, "relay upstream fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "relay failed" })),
            )
                .into_response();
        }
    };

    let mut builder = Response::builder().status(upstream.status());
    for name in MIRRORED_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            builder = builder.header(name, value.clone());
        }
    }
    builder = builder.header(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %target, error = %e, "relay response assembly failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "relay failed" })),
            )
                .into_response()
        }
    }
}
