//! Consumer-side state machine for one watch attempt.

use tokio::sync::mpsc;

use crate::delivery::DeliveryEvent;
use crate::errors::SessionError;
use crate::prefs::ProviderPreferences;
use crate::types::StreamSource;

/// Phase of a consumer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, channel not yet opened.
    Idle,
    /// Ingesting delivery events.
    Loading,
    /// Terminal: the channel completed with at least one accepted source.
    Complete,
    /// Terminal: the channel errored, or nothing survived filtering.
    Failed,
}

/// State machine that ingests a delivery stream on the watching side.
///
/// Applies provider preference filtering, auto-selects the first accepted
/// source so playback can start before the lookup completes, and lets the
/// user re-select any accumulated source without restarting the pipeline.
/// One session per watch attempt; a new attempt means a new session.
#[derive(Debug)]
pub struct ConsumerSession {
    prefs: ProviderPreferences,
    sources: Vec<StreamSource>,
    selected: Option<StreamSource>,
    phase: SessionPhase,
    error: Option<SessionError>,
    cancelled: bool,
}

impl ConsumerSession {
    /// Creates an idle session with a preference snapshot.
    ///
    /// Preferences are read once here and never re-read mid-session.
    pub fn new(prefs: ProviderPreferences) -> Self {
        Self {
            prefs,
            sources: Vec::new(),
            selected: None,
            phase: SessionPhase::Idle,
            error: None,
            cancelled: false,
        }
    }

    /// Enters `Loading`; the caller opens the delivery channel alongside.
    pub fn begin(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Loading;
        }
    }

    /// Applies one delivery event to the session.
    ///
    /// Events arriving after cancellation or after a terminal phase are
    /// ignored; no partial state is surfaced once the session ends.
    pub fn handle_event(&mut self, event: DeliveryEvent) {
        if self.cancelled || self.phase != SessionPhase::Loading {
            return;
        }

        match event {
            DeliveryEvent::Start => {
                self.sources.clear();
                self.selected = None;
            }
            DeliveryEvent::Source { data } => {
                if !self.prefs.allows(&data.provider) {
                    tracing::debug!(provider = %data.provider, "source filtered by preferences");
                    return;
                }
                if self.selected.is_none() {
                    // Instant start: the first accepted source plays
                    // without waiting for the lookup to complete.
                    self.selected = Some(data.clone());
                }
                self.sources.push(data);
            }
            DeliveryEvent::Complete { .. } => {
                if self.sources.is_empty() {
                    self.error = Some(SessionError::NoStreamsAvailable);
                    self.phase = SessionPhase::Failed;
                } else {
                    self.phase = SessionPhase::Complete;
                }
            }
            DeliveryEvent::Error { message } => {
                self.error = Some(SessionError::Delivery { message });
                self.phase = SessionPhase::Failed;
            }
        }
    }

    /// Drives the session over an event stream until it terminates.
    ///
    /// Used where the channel is consumed in-process; remote consumers
    /// feed `handle_event` from their own transport loop instead.
    pub async fn drive(&mut self, mut events: mpsc::Receiver<DeliveryEvent>) {
        self.begin();
        while let Some(event) = events.recv().await {
            self.handle_event(event);
            if self.is_terminal() {
                break;
            }
        }
    }

    /// Selects an accumulated source by URL. Does not change phase.
    ///
    /// Returns false if no accumulated source has that URL.
    pub fn select_url(&mut self, url: &str) -> bool {
        if self.cancelled {
            return false;
        }
        match self.sources.iter().find(|s| s.url == url) {
            Some(source) => {
                self.selected = Some(source.clone());
                true
            }
            None => false,
        }
    }

    /// Tears the session down.
    ///
    /// Accumulated sources and the selection are discarded and later
    /// events are dropped; a cancelled session surfaces no partial state.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.sources.clear();
        self.selected = None;
    }

    /// Sources accepted so far, in arrival order.
    pub fn sources(&self) -> &[StreamSource] {
        &self.sources
    }

    /// The currently selected source, if any.
    pub fn selected(&self) -> Option<&StreamSource> {
        self.selected.as_ref()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Terminal error, if the session failed.
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Whether playback can start (a source has been selected).
    pub fn is_playable(&self) -> bool {
        self.selected.is_some()
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Complete | SessionPhase::Failed)
    }
}
