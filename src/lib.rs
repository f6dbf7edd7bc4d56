pub mod attachments;
pub mod composer;
pub mod config;
pub mod speech;

pub use attachments::{AttachmentStore, ImageBlob};
pub use composer::{ComposedMessage, ComposerController, ComposerEvent, ComposerHost};
pub use config::ComposerConfig;
pub use speech::{RecognitionProvider, SpeechSession};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposerError {
    #[error("Speech recognition unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Recognition engine error: {0}")]
    EngineError(String),

    #[error("Attachment encoding failed: {0}")]
    EncodingFailure(String),

    #[error("No attachment at index {0}")]
    InvalidIndex(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for ComposerError {
    fn from(e: std::io::Error) -> Self {
        ComposerError::IOError(e.to_string())
    }
}

impl ComposerError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The host simply has no engine; voice input stays disabled
            ComposerError::CapabilityUnavailable(_) => false,
            // Engines report transient failures (no-speech, network, aborted)
            ComposerError::EngineError(_) => true,
            // Only the affected attachment is lost
            ComposerError::EncodingFailure(_) => true,
            ComposerError::InvalidIndex(_) => true,
            ComposerError::ConfigError(_) => false,
            ComposerError::IOError(_) => true,
            ComposerError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ComposerError::CapabilityUnavailable(_) => {
                "Voice input is not supported here.".to_string()
            }
            ComposerError::EngineError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            ComposerError::EncodingFailure(_) => {
                "An image could not be attached.".to_string()
            }
            ComposerError::InvalidIndex(_) => "That image is no longer attached.".to_string(),
            ComposerError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ComposerError::IOError(_) => "File system error occurred.".to_string(),
            ComposerError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposerError>;
