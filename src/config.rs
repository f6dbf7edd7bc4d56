//! Configuration for the composer
//!
//! Provides centralized configuration for the speech session, the attachment
//! pipeline and the controller's commit policy.

use crate::speech::SpeechOptions;
use crate::{ComposerError, Result};
use serde::{Deserialize, Serialize};

/// Default upper bound for a single attachment (20 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for the attachment encoding pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Number of encoder worker threads
    pub encoder_workers: usize,

    /// Blobs larger than this fail to encode (None for no limit)
    pub max_image_bytes: Option<usize>,

    /// Apply the picker's `image/*` filter to picker selections
    pub picker_images_only: bool,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            encoder_workers: 2,
            max_image_bytes: Some(DEFAULT_MAX_IMAGE_BYTES),
            picker_images_only: true,
        }
    }
}

/// Configuration for the complete composer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Recognition engine options
    pub speech: SpeechOptions,

    /// Attachment pipeline options
    pub attachments: AttachmentConfig,

    /// Keep the typed text when dictation stops without any transcript
    pub restore_typed_text_on_empty_transcript: bool,

    /// Commit the transcript when the engine ends the session on its own
    pub commit_on_engine_end: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            // The composer dictates continuously until the user toggles off
            speech: SpeechOptions {
                continuous: true,
                ..SpeechOptions::default()
            },
            attachments: AttachmentConfig::default(),
            restore_typed_text_on_empty_transcript: false,
            commit_on_engine_end: false,
        }
    }
}

impl ComposerConfig {
    /// Parse a configuration from a JSON document; missing fields use defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ComposerError::ConfigError(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the recognition options
    pub fn with_speech(mut self, speech: SpeechOptions) -> Self {
        self.speech = speech;
        self
    }

    /// Set the recognition language
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.speech.lang = lang.into();
        self
    }

    /// Set the number of encoder worker threads
    pub fn with_encoder_workers(mut self, workers: usize) -> Self {
        self.attachments.encoder_workers = workers;
        self
    }

    /// Set the per-attachment size limit
    pub fn with_max_image_bytes(mut self, limit: Option<usize>) -> Self {
        self.attachments.max_image_bytes = limit;
        self
    }

    /// Keep typed text when dictation stops with an empty transcript
    pub fn restore_typed_text(mut self) -> Self {
        self.restore_typed_text_on_empty_transcript = true;
        self
    }

    /// Commit the transcript when the engine ends the session on its own
    pub fn commit_engine_end_transcript(mut self) -> Self {
        self.commit_on_engine_end = true;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.speech.lang.trim().is_empty() {
            return Err(ComposerError::ConfigError(
                "Recognition language must not be empty".to_string(),
            ));
        }

        if self.attachments.encoder_workers == 0 {
            return Err(ComposerError::ConfigError(
                "At least one encoder worker is required".to_string(),
            ));
        }

        if self.attachments.max_image_bytes == Some(0) {
            return Err(ComposerError::ConfigError(
                "max_image_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
