//! Speech session state machine
//!
//! Owns exactly one recognition engine for its lifetime and turns the
//! engine's raw notifications into transcript updates.
//!
//! ```text
//!            start()               stop()
//!   Idle ───────────────▶ Listening ──────────▶ Stopped
//!    ▲                       │                     │
//!    │      End (engine)     │       End           │
//!    └───────────────────────┴─────────────────────┘
//! ```
//!
//! `stop()` only requests the engine to stop; the session returns to `Idle`
//! when the engine confirms with [`EngineEvent::End`]. Results that arrive
//! after a stop request are dropped, and an `End` while already `Idle` is
//! ignored, so a late notification can never clear state twice.

use crate::speech::engine::{
    EngineEvent, RecognitionEngine, RecognitionProvider, SpeechOptions, PUNCTUATION_GRAMMAR,
    PUNCTUATION_GRAMMAR_WEIGHT,
};
use crate::{ComposerError, Result};
use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, info, warn};

/// Lifecycle of the recognition session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecognitionState {
    /// No session running
    #[default]
    Idle,
    /// Receiving results
    Listening,
    /// Stop requested, waiting for the engine to end the session
    Stopped,
}

impl RecognitionState {
    /// Check if results are currently being taken
    pub fn is_listening(&self) -> bool {
        matches!(self, RecognitionState::Listening)
    }

    /// Check if idle
    pub fn is_idle(&self) -> bool {
        matches!(self, RecognitionState::Idle)
    }
}

impl std::fmt::Display for RecognitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionState::Idle => write!(f, "Idle"),
            RecognitionState::Listening => write!(f, "Listening"),
            RecognitionState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Events the session reports to its owner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The transcript changed; carries the full current transcript
    TranscriptUpdated(String),

    /// The engine ended the session
    SessionEnded {
        /// True when the end follows a `stop()` request
        requested: bool,
        /// Transcript held when the session ended (now cleared)
        transcript: String,
    },

    /// Non-fatal engine error
    Error(ComposerError),
}

/// Upper-case the first character, leaving the rest untouched
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the displayed transcript from an engine result list
pub fn assemble_transcript(segments: &[String]) -> String {
    capitalize_first(&segments.concat())
}

/// A recognition session bound to one engine instance
pub struct SpeechSession {
    engine: Option<Box<dyn RecognitionEngine>>,
    unavailable: Option<ComposerError>,
    options: SpeechOptions,
    grammar_enabled: bool,
    state: RecognitionState,
    transcript: String,
    events_rx: Receiver<EngineEvent>,
}

impl SpeechSession {
    /// Create the engine through `provider` and configure it once.
    ///
    /// A provider without recognition capability yields a session whose
    /// operations are all no-ops; see [`SpeechSession::capability_error`].
    pub fn new(provider: &dyn RecognitionProvider, options: SpeechOptions) -> Self {
        let (events_tx, events_rx) = unbounded();
        let mut engine = provider.create(events_tx);

        let mut grammar_enabled = false;
        let unavailable = match engine.as_mut() {
            Some(engine) => {
                engine.configure(&options);
                grammar_enabled = engine.set_grammar(PUNCTUATION_GRAMMAR, PUNCTUATION_GRAMMAR_WEIGHT);
                info!(
                    provider = provider.name(),
                    lang = %options.lang,
                    continuous = options.continuous,
                    grammar = grammar_enabled,
                    "Speech recognition ready"
                );
                None
            }
            None => {
                warn!(provider = provider.name(), "Speech recognition is not supported");
                Some(ComposerError::CapabilityUnavailable(format!(
                    "provider '{}' has no recognition engine",
                    provider.name()
                )))
            }
        };

        Self {
            engine,
            unavailable,
            options,
            grammar_enabled,
            state: RecognitionState::Idle,
            transcript: String::new(),
            events_rx,
        }
    }

    /// Whether a recognition engine exists
    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// The capability-unavailable condition, if the host has no engine
    pub fn capability_error(&self) -> Option<&ComposerError> {
        self.unavailable.as_ref()
    }

    pub fn options(&self) -> &SpeechOptions {
        &self.options
    }

    /// Whether the punctuation grammar was accepted by the engine
    pub fn grammar_enabled(&self) -> bool {
        self.grammar_enabled
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }

    /// Current transcript; empty outside a session
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Start a session. No-op when already active or when no engine exists.
    pub fn start(&mut self) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else {
            debug!("start ignored: no recognition engine");
            return Ok(());
        };

        if !self.state.is_idle() {
            debug!(state = %self.state, "start ignored: session already active");
            return Ok(());
        }

        engine.start()?;
        self.transcript.clear();
        self.state = RecognitionState::Listening;
        info!("Listening started");
        Ok(())
    }

    /// Request the engine to stop. No-op unless listening.
    pub fn stop(&mut self) {
        if !self.state.is_listening() {
            debug!(state = %self.state, "stop ignored: not listening");
            return;
        }

        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.state = RecognitionState::Stopped;
        info!("Listening stop requested");
    }

    /// Drain pending engine notifications in delivery order
    pub fn poll(&mut self) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(event) = self.handle_engine_event(event) {
                events.push(event);
            }
        }
        events
    }

    /// Apply one engine notification to the state machine
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<SpeechEvent> {
        match event {
            EngineEvent::Results(segments) => {
                if !self.state.is_listening() {
                    debug!(state = %self.state, "Dropping result outside of a listening period");
                    return None;
                }
                self.transcript = assemble_transcript(&segments);
                debug!(len = self.transcript.len(), "Transcript updated");
                Some(SpeechEvent::TranscriptUpdated(self.transcript.clone()))
            }
            EngineEvent::Error(reason) => {
                warn!(state = %self.state, "Recognition error: {}", reason);
                Some(SpeechEvent::Error(ComposerError::EngineError(reason)))
            }
            EngineEvent::End => {
                let requested = match self.state {
                    RecognitionState::Idle => {
                        debug!("Ignoring end notification while idle");
                        return None;
                    }
                    RecognitionState::Listening => false,
                    RecognitionState::Stopped => true,
                };
                self.state = RecognitionState::Idle;
                let transcript = std::mem::take(&mut self.transcript);
                info!(requested, "Recognition session ended");
                Some(SpeechEvent::SessionEnded {
                    requested,
                    transcript,
                })
            }
        }
    }

    /// Stop the engine regardless of state and release it
    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
            debug!("Recognition engine released");
        }
        self.state = RecognitionState::Idle;
        self.transcript.clear();
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SpeechSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSession")
            .field("available", &self.is_available())
            .field("state", &self.state)
            .field("transcript", &self.transcript)
            .finish()
    }
}
