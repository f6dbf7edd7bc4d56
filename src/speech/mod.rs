//! Speech input for the composer
//!
//! This module provides:
//! - The recognition engine capability (provider + engine traits)
//! - The speech session state machine that turns engine results into a transcript
//! - A scripted engine for tests and demos

pub mod engine;
pub mod scripted;
pub mod session;

// Re-export commonly used types
pub use engine::{
    EngineEvent, NoRecognition, RecognitionEngine, RecognitionProvider, SpeechOptions,
    PUNCTUATION_GRAMMAR,
};
pub use scripted::{ScriptedHandle, ScriptedProvider};
pub use session::{RecognitionState, SpeechEvent, SpeechSession};
