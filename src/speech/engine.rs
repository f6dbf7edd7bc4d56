//! Recognition engine capability
//!
//! The host environment owns the actual speech recognizer. The composer only
//! sees it through [`RecognitionProvider`] (capability detection plus
//! construction) and [`RecognitionEngine`] (start/stop). Incremental results,
//! errors and end-of-session notifications flow back over a channel as
//! [`EngineEvent`]s.

use crate::Result;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Punctuation grammar offered to engines that accept grammar hints
pub const PUNCTUATION_GRAMMAR: &str =
    "#JSGF V1.0; grammar punctuation; public <punc> = . | , | ! | ; | : ;";

/// Weight given to the punctuation grammar
pub const PUNCTUATION_GRAMMAR_WEIGHT: f32 = 1.0;

/// Options applied once when the engine is created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechOptions {
    /// Deliver interim (non-final) results
    pub interim_results: bool,

    /// BCP 47 language tag
    pub lang: String,

    /// Keep listening across pauses instead of finalizing once
    pub continuous: bool,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            interim_results: true,
            lang: "en-US".to_string(),
            continuous: false,
        }
    }
}

/// Notifications delivered by a recognition engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine's current result list for this session, in arrival order.
    /// Each entry is the best alternative of one result segment.
    Results(Vec<String>),

    /// A non-fatal error (no-speech, network, aborted, ...)
    Error(String),

    /// The engine session finished, either on request or on its own
    End,
}

/// A single recognizer instance
pub trait RecognitionEngine: Send {
    /// Apply session options; called once before the first start
    fn configure(&mut self, options: &SpeechOptions);

    /// Offer a grammar hint. Returns false when grammars are not supported.
    fn set_grammar(&mut self, _grammar: &str, _weight: f32) -> bool {
        false
    }

    /// Begin a recognition session. Failures may also arrive later as
    /// [`EngineEvent::Error`].
    fn start(&mut self) -> Result<()>;

    /// Request the session to stop. The engine confirms with [`EngineEvent::End`].
    fn stop(&mut self);
}

/// Capability detection and construction of recognition engines
pub trait RecognitionProvider {
    /// Create an engine that reports on `events`, or `None` when the host
    /// has no recognition capability
    fn create(&self, events: Sender<EngineEvent>) -> Option<Box<dyn RecognitionEngine>>;

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        "recognition"
    }
}

/// Provider for hosts without speech recognition
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecognition;

impl RecognitionProvider for NoRecognition {
    fn create(&self, _events: Sender<EngineEvent>) -> Option<Box<dyn RecognitionEngine>> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_default_options() {
        let options = SpeechOptions::default();
        assert!(options.interim_results);
        assert_eq!(options.lang, "en-US");
        assert!(!options.continuous);
    }

    #[test]
    fn test_no_recognition_creates_nothing() {
        let (tx, _rx) = unbounded();
        assert!(NoRecognition.create(tx).is_none());
    }
}
