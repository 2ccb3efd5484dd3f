//! Error types for the stream resolution pipeline.

use std::time::Duration;

use thiserror::Error;

/// A missing or malformed title identifier.
///
/// Always a client fault rejected locally, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("title identifier must be a non-empty string")]
pub struct InvalidTitle;

/// Errors from a single provider client.
///
/// Per-provider and isolated: the aggregator recovers from these locally
/// and the failing provider simply contributes zero sources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The upstream service answered with a non-success status.
    #[error("provider '{provider}' returned HTTP {status}")]
    Upstream {
        /// Name of the failing provider
        provider: String,
        /// HTTP status code returned upstream
        status: u16,
    },

    /// No response arrived within the bounded window.
    #[error("provider '{provider}' timed out after {timeout:?}")]
    Timeout {
        /// Name of the failing provider
        provider: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The payload could not be parsed into stream source records.
    #[error("provider '{provider}' sent a malformed response: {reason}")]
    Malformed {
        /// Name of the failing provider
        provider: String,
        /// Why parsing failed
        reason: String,
    },

    /// The request could not be completed at the transport level.
    #[error("provider '{provider}' request failed: {reason}")]
    Network {
        /// Name of the failing provider
        provider: String,
        /// Transport-level failure description
        reason: String,
    },
}

/// Errors surfaced by a whole aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Every configured provider failed; no sources could be discovered.
    #[error("all {attempted} providers failed to return streams")]
    AllProvidersFailed {
        /// How many providers were attempted
        attempted: usize,
    },
}

/// Terminal error conditions of a consumer session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Every provider answered but nothing survived preference filtering.
    #[error("no streams available from enabled providers")]
    NoStreamsAvailable,

    /// The delivery channel ended with an error event.
    #[error("stream lookup failed: {message}")]
    Delivery {
        /// Message carried by the terminal error event
        message: String,
    },
}
