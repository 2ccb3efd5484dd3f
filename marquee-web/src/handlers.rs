//! Handlers for the stream lookup endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use futures::StreamExt;
use marquee_core::types::{StreamSource, TitleId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use crate::server::AppState;

/// Query parameters of both lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct StreamsQuery {
    /// Title identifier to resolve.
    pub title: Option<String>,
}

/// Body of a successful bulk lookup.
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    /// Discovered stream sources; empty on "nothing found" and on
    /// internal failure alike.
    pub sources: Vec<StreamSource>,
}

type Rejection = (StatusCode, Json<serde_json::Value>);

/// Validates the `title` query parameter before anything touches the
/// network.
fn parse_title(query: &StreamsQuery) -> Result<TitleId, Rejection> {
    let raw = query.title.as_deref().unwrap_or_default();
    TitleId::parse(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

/// `GET /streams?title=<id>` - resolve all sources for a title.
///
/// Internal failures are swallowed into an empty source list at this
/// boundary; callers cannot distinguish "nothing found" from "error"
/// here.
pub async fn bulk_streams(
    State(state): State<AppState>,
    Query(query): Query<StreamsQuery>,
) -> Result<Json<SourcesResponse>, Rejection> {
    let title = parse_title(&query)?;

    if let Some(sources) = state.cache.get(&title) {
        return Ok(Json(SourcesResponse { sources }));
    }

    match state.aggregator.aggregate(title.clone()).await {
        Ok(sources) => {
            state.cache.put(&title, sources.clone());
            Ok(Json(SourcesResponse { sources }))
        }
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "bulk lookup failed, returning empty list");
            Ok(Json(SourcesResponse { sources: Vec::new() }))
        }
    }
}

/// `GET /streams/progressive?title=<id>` - push sources as discovered.
///
/// Frames follow the delivery grammar: one `start`, `source` frames in
/// discovery order, one terminal `complete` or `error`. Invalid titles
/// are rejected with a plain 400 before the channel opens.
pub async fn progressive_streams(
    State(state): State<AppState>,
    Query(query): Query<StreamsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, Rejection> {
    let title = parse_title(&query)?;

    let events = state.channel.open(title);
    let stream = ReceiverStream::new(events).map(|event| Event::default().json_data(&event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// `GET /health` - liveness probe with uptime.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "marquee",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "providers": state.aggregator.provider_count(),
    }))
}
