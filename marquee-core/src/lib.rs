//! Marquee Core - Stream discovery and progressive delivery
//!
//! This crate provides the building blocks for resolving playable stream
//! sources for a catalog title: provider clients that query upstream
//! services, an aggregator that fans out across providers, a short-TTL
//! result cache, a push-based delivery channel, and the consumer state
//! machine that ingests the channel on the watching side.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod consumer;
pub mod delivery;
pub mod errors;
pub mod prefs;
pub mod providers;
pub mod relay;
pub mod types;


// Re-export main types for convenient access
pub use aggregator::{ProgressiveRun, StreamAggregator};
pub use cache::ResultCache;
pub use config::MarqueeConfig;
pub use consumer::{ConsumerSession, SessionPhase};
pub use delivery::{DeliveryChannel, DeliveryEvent};
pub use errors::{AggregateError, InvalidTitle, ProviderError, SessionError};
pub use prefs::{FilePreferenceStore, PreferenceStore, ProviderPreferences};
pub use providers::StreamProvider;
pub use relay::{PlaybackRelay, ProxyRelay};
pub use types::{StreamSource, TitleId};
