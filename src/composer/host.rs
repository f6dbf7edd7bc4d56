//! External collaborators of the composer
//!
//! The input text, the submit function and the abort hook belong to the
//! surrounding chat. The composer reads and occasionally overwrites the text
//! but never owns its storage.

use crate::composer::message::ComposedMessage;

pub trait ComposerHost {
    /// Current input text
    fn input(&self) -> &str;

    /// Overwrite the input text
    fn set_input(&mut self, text: String);

    /// The user edited the text field
    fn handle_input_change(&mut self, text: String) {
        self.set_input(text);
    }

    /// Send a composed message
    fn submit(&mut self, message: ComposedMessage);

    /// Abort the send in flight
    fn stop(&mut self);
}

/// Host that keeps everything in memory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryHost {
    pub input: String,
    pub submitted: Vec<ComposedMessage>,
    pub stop_requests: usize,
}

impl InMemoryHost {
    pub fn with_input(text: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            ..Self::default()
        }
    }
}

impl ComposerHost for InMemoryHost {
    fn input(&self) -> &str {
        &self.input
    }

    fn set_input(&mut self, text: String) {
        self.input = text;
    }

    fn submit(&mut self, message: ComposedMessage) {
        self.submitted.push(message);
    }

    fn stop(&mut self) {
        self.stop_requests += 1;
    }
}
