//! The outgoing message produced by the composer

use crate::{ComposerError, Result};
use serde::{Deserialize, Serialize};

/// Text plus encoded images, handed to the host's submit function
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub text: String,
    /// `data:` URIs in attachment order
    pub images: Vec<String>,
}

impl ComposedMessage {
    pub fn new(text: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            text: text.into(),
            images,
        }
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ComposerError::EncodingFailure(format!("Failed to serialize message: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let message = ComposedMessage::new("hello", vec!["data:image/png;base64,YQ==".into()]);
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(value["text"], "hello");
        assert_eq!(value["images"][0], "data:image/png;base64,YQ==");
        assert!(message.has_images());
    }
}
