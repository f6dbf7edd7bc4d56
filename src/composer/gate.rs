//! Submission gate
//!
//! A message may be submitted only when the text is non-empty after
//! trimming, no send is in flight, and dictation is not running.

/// Why submission is currently refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateBlock {
    /// A previous message is still being sent
    Sending,
    /// Dictation is running; the transcript has not been committed yet
    Listening,
    /// Nothing but whitespace to send
    EmptyText,
}

impl std::fmt::Display for GateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateBlock::Sending => write!(f, "a message is being sent"),
            GateBlock::Listening => write!(f, "voice input is active"),
            GateBlock::EmptyText => write!(f, "the message is empty"),
        }
    }
}

/// Snapshot of the inputs that decide whether submission is allowed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionGate {
    pub has_text: bool,
    pub is_sending: bool,
    pub is_listening: bool,
}

/// Whether `text` has anything besides whitespace
pub fn has_text(text: &str) -> bool {
    !text.trim().is_empty()
}

impl SubmissionGate {
    pub fn evaluate(text: &str, is_sending: bool, is_listening: bool) -> Self {
        Self {
            has_text: has_text(text),
            is_sending,
            is_listening,
        }
    }

    pub fn is_open(&self) -> bool {
        self.blocked_by().is_none()
    }

    /// The first reason submission is refused, if any
    pub fn blocked_by(&self) -> Option<GateBlock> {
        if self.is_sending {
            Some(GateBlock::Sending)
        } else if self.is_listening {
            Some(GateBlock::Listening)
        } else if !self.has_text {
            Some(GateBlock::EmptyText)
        } else {
            None
        }
    }
}
