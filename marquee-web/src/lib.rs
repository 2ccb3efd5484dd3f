//! Marquee Web - JSON API Server
//!
//! Exposes the stream resolution pipeline over HTTP: a bulk lookup
//! endpoint, a progressive SSE endpoint, the playback relay and a health
//! probe.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod handlers;
pub mod relay;
pub mod server;

// Re-export main types
pub use server::{AppState, router, run_server};
