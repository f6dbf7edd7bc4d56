//! Composite input controller
//!
//! Reconciles typed text, live dictation and pending attachments into one
//! submission-ready message.

pub mod controller;
pub mod gate;
pub mod host;
pub mod input;
pub mod message;

pub use controller::{AttachmentView, ComposerController, ComposerEvent, ComposerView, SubmitOutcome};
pub use gate::{GateBlock, SubmissionGate};
pub use host::{ComposerHost, InMemoryHost};
pub use input::{Key, KeyOutcome, KeyPress};
pub use message::ComposedMessage;
