//! Composer controller
//!
//! Owns the speech session and the attachment store for its lifetime and
//! drives them from the actions the surrounding UI triggers.
//!
//! While not listening the displayed text is the host's input. While
//! listening it is the live transcript, and edits to the field are dropped.
//! Toggling dictation off commits the transcript into the host's input
//! (clearing it when nothing was heard); this is the only place the two text
//! channels merge. A send that starts while listening forces the same
//! stop-and-commit first. When the engine ends the session on its own the
//! transcript is dropped unless `commit_on_engine_end` is configured.
//!
//! Engine notifications and encoding results are applied by
//! [`ComposerController::poll_events`], which the host calls from its event
//! loop. Actions that depend on the freshest state poll internally first.

use crate::attachments::{AttachmentEvent, AttachmentStore, ImageBlob};
use crate::composer::gate::{GateBlock, SubmissionGate};
use crate::composer::host::ComposerHost;
use crate::composer::input::{KeyOutcome, KeyPress};
use crate::composer::message::ComposedMessage;
use crate::config::ComposerConfig;
use crate::speech::{RecognitionProvider, SpeechEvent, SpeechSession};
use crate::{ComposerError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder shown while dictating
pub const LISTENING_PLACEHOLDER: &str = "Listening";

/// Placeholder shown otherwise
pub const PROMPT_PLACEHOLDER: &str = "Enter your prompt here";

/// Observable changes, in the order they happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposerEvent {
    ListeningStarted,

    /// Live transcript changed
    TranscriptUpdated(String),

    /// The transcript was written into the host's input
    TranscriptCommitted(String),

    /// The engine ended the dictation session
    ListeningEnded { requested: bool },

    /// Non-fatal speech failure
    EngineError(ComposerError),

    /// A new attachment generation is visible
    AttachmentsPublished {
        generation: u64,
        count: usize,
        failed: usize,
    },

    /// One attachment of the visible generation failed to encode
    AttachmentFailed {
        index: usize,
        name: String,
        error: ComposerError,
    },

    Submitted(ComposedMessage),

    SubmissionBlocked(GateBlock),

    /// The abort hook was forwarded to the host
    SendAborted,
}

/// Result of a submission attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(ComposedMessage),
    Blocked(GateBlock),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// One thumbnail of the attachment strip
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentView {
    pub name: String,
    pub added_at: DateTime<Utc>,
    pub data_uri: Option<String>,
    pub error: Option<String>,
}

/// Everything a renderer needs to draw the composer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerView {
    pub text: String,
    pub placeholder: &'static str,
    pub mic_enabled: bool,
    pub mic_active: bool,
    pub send_enabled: bool,
    pub stop_visible: bool,
    pub attachments: Vec<AttachmentView>,
}

pub struct ComposerController<H: ComposerHost> {
    host: H,
    speech: SpeechSession,
    attachments: AttachmentStore,
    config: ComposerConfig,
    is_sending: bool,
    last_error: Option<ComposerError>,
    outbox: Vec<ComposerEvent>,
}

impl<H: ComposerHost> ComposerController<H> {
    /// Create a controller with a worker-pool attachment store
    pub fn new(host: H, provider: &dyn RecognitionProvider, config: ComposerConfig) -> Result<Self> {
        config.validate()?;
        let attachments = AttachmentStore::new(&config.attachments)?;
        Ok(Self::with_attachment_store(host, provider, config, attachments))
    }

    /// Create a controller around an existing attachment store
    pub fn with_attachment_store(
        host: H,
        provider: &dyn RecognitionProvider,
        config: ComposerConfig,
        attachments: AttachmentStore,
    ) -> Self {
        let speech = SpeechSession::new(provider, config.speech.clone());
        let last_error = speech.capability_error().cloned();

        Self {
            host,
            speech,
            attachments,
            config,
            is_sending: false,
            last_error,
            outbox: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn speech(&self) -> &SpeechSession {
        &self.speech
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn is_listening(&self) -> bool {
        self.speech.is_listening()
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// Whether voice input can be offered at all
    pub fn voice_available(&self) -> bool {
        self.speech.is_available()
    }

    /// Most recent channel-local failure
    pub fn last_error(&self) -> Option<&ComposerError> {
        self.last_error.as_ref()
    }

    /// Text the field should show right now
    pub fn display_text(&self) -> &str {
        if self.speech.is_listening() {
            self.speech.transcript()
        } else {
            self.host.input()
        }
    }

    pub fn placeholder(&self) -> &'static str {
        if self.speech.is_listening() {
            LISTENING_PLACEHOLDER
        } else {
            PROMPT_PLACEHOLDER
        }
    }

    pub fn gate(&self) -> SubmissionGate {
        SubmissionGate::evaluate(self.host.input(), self.is_sending, self.speech.is_listening())
    }

    pub fn can_submit(&self) -> bool {
        self.gate().is_open()
    }

    /// Toggle voice input: start dictation, or stop it and commit the transcript
    pub fn listen(&mut self) {
        self.pump_speech();

        if self.speech.is_listening() {
            self.stop_voice_input();
        } else {
            self.start_listening();
        }
    }

    fn start_listening(&mut self) {
        if self.is_sending {
            debug!("Voice input disabled while sending");
            return;
        }

        if let Some(error) = self.speech.capability_error() {
            debug!("Voice input unavailable: {}", error);
            self.last_error = Some(error.clone());
            return;
        }

        match self.speech.start() {
            Ok(()) if self.speech.is_listening() => {
                self.outbox.push(ComposerEvent::ListeningStarted);
            }
            Ok(()) => debug!(state = %self.speech.state(), "Listening not started"),
            Err(e) => {
                warn!("Failed to start listening: {}", e);
                self.last_error = Some(e.clone());
                self.outbox.push(ComposerEvent::EngineError(e));
            }
        }
    }

    fn stop_voice_input(&mut self) {
        let transcript = self.speech.transcript().to_string();
        self.commit(transcript);
        self.speech.stop();
    }

    fn commit(&mut self, transcript: String) {
        if transcript.is_empty() && self.config.restore_typed_text_on_empty_transcript {
            debug!("Nothing dictated; keeping typed text");
            return;
        }

        info!(len = transcript.len(), "Committing transcript to input");
        self.host.set_input(transcript.clone());
        self.outbox.push(ComposerEvent::TranscriptCommitted(transcript));
    }

    /// The text field changed. Ignored while dictating.
    pub fn text_changed(&mut self, text: impl Into<String>) {
        if self.speech.is_listening() {
            debug!("Ignoring text edit while listening");
            return;
        }
        self.host.handle_input_change(text.into());
    }

    /// Handle a key press in the text field
    pub fn key_pressed(&mut self, key: KeyPress) -> KeyOutcome {
        if !key.is_submit() {
            return KeyOutcome::default();
        }

        KeyOutcome {
            prevent_default: true,
            submitted: self.submit().is_submitted(),
        }
    }

    /// Compose the message and hand it to the host if the gate is open
    pub fn submit(&mut self) -> SubmitOutcome {
        self.pump();

        if let Some(block) = self.gate().blocked_by() {
            debug!("Submission blocked: {}", block);
            self.outbox.push(ComposerEvent::SubmissionBlocked(block));
            return SubmitOutcome::Blocked(block);
        }

        if self.attachments.is_encoding() {
            debug!(
                generation = self.attachments.generation(),
                "Submitting with the published attachments still attached"
            );
        }

        let message = ComposedMessage::new(self.host.input(), self.attachments.images());
        info!(
            text_len = message.text.len(),
            images = message.images.len(),
            "Submitting message"
        );
        self.host.submit(message.clone());
        self.outbox.push(ComposerEvent::Submitted(message.clone()));
        SubmitOutcome::Submitted(message)
    }

    /// The host's send-in-flight flag changed
    pub fn set_loading(&mut self, loading: bool) {
        if loading == self.is_sending {
            return;
        }
        self.is_sending = loading;
        debug!(loading, "Sending state changed");

        if loading {
            self.pump_speech();
            if self.speech.is_listening() {
                info!("Send started while listening; committing transcript");
                self.stop_voice_input();
            }
        }
    }

    /// Cancel the send in flight. Speech and attachments are untouched.
    pub fn stop(&mut self) {
        if !self.is_sending {
            debug!("Stop ignored: nothing is being sent");
            return;
        }
        info!("Aborting send");
        self.host.stop();
        self.outbox.push(ComposerEvent::SendAborted);
    }

    /// Files chosen with the file picker
    pub fn files_selected(&mut self, files: Vec<ImageBlob>) -> usize {
        let files = if self.config.attachments.picker_images_only {
            let (images, rejected): (Vec<_>, Vec<_>) =
                files.into_iter().partition(ImageBlob::is_image);
            for blob in &rejected {
                warn!(name = %blob.name, "Skipping non-image selection");
            }
            images
        } else {
            files
        };
        self.attachments.append(files)
    }

    /// Files dropped onto the composer
    pub fn files_dropped(&mut self, files: Vec<ImageBlob>) -> usize {
        self.attachments.append(files)
    }

    /// Remove the attachment at `index`; out-of-range indices are ignored
    pub fn remove_attachment(&mut self, index: usize) -> bool {
        self.attachments.remove_at(index).is_some()
    }

    /// Drop all attachments, e.g. after the host accepted a submission
    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
    }

    /// Apply pending engine notifications and encoding results
    pub fn poll_events(&mut self) -> Vec<ComposerEvent> {
        self.pump();
        std::mem::take(&mut self.outbox)
    }

    /// Block until the current attachments are encoded, then poll
    pub fn wait_for_attachments(&mut self, timeout: Duration) -> Vec<ComposerEvent> {
        let events = self.attachments.wait_until_settled(timeout);
        self.record_attachment_events(events);
        self.poll_events()
    }

    pub fn view(&self) -> ComposerView {
        let attachments = self
            .attachments
            .visible()
            .into_iter()
            .map(|(entry, item)| AttachmentView {
                name: item.name.clone(),
                added_at: entry.added_at,
                data_uri: item.data_uri().map(str::to_string),
                error: item.error().map(ToString::to_string),
            })
            .collect();

        ComposerView {
            text: self.display_text().to_string(),
            placeholder: self.placeholder(),
            mic_enabled: self.speech.is_available() && !self.is_sending,
            mic_active: self.speech.is_listening(),
            send_enabled: self.can_submit(),
            stop_visible: self.is_sending,
            attachments,
        }
    }

    /// Stop the recognition engine regardless of state
    pub fn shutdown(&mut self) {
        self.speech.shutdown();
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn pump(&mut self) {
        self.pump_speech();
        let events = self.attachments.poll();
        self.record_attachment_events(events);
    }

    fn pump_speech(&mut self) {
        for event in self.speech.poll() {
            match event {
                SpeechEvent::TranscriptUpdated(text) => {
                    self.outbox.push(ComposerEvent::TranscriptUpdated(text));
                }
                SpeechEvent::SessionEnded {
                    requested,
                    transcript,
                } => {
                    // A requested end was already committed by stop_voice_input
                    if !requested && self.config.commit_on_engine_end && !transcript.is_empty() {
                        self.commit(transcript);
                    }
                    self.outbox.push(ComposerEvent::ListeningEnded { requested });
                }
                SpeechEvent::Error(error) => {
                    self.last_error = Some(error.clone());
                    self.outbox.push(ComposerEvent::EngineError(error));
                }
            }
        }
    }

    fn record_attachment_events(&mut self, events: Vec<AttachmentEvent>) {
        for event in events {
            match event {
                AttachmentEvent::Published {
                    generation,
                    count,
                    failed,
                } => self.outbox.push(ComposerEvent::AttachmentsPublished {
                    generation,
                    count,
                    failed,
                }),
                AttachmentEvent::EncodingFailed { index, name, error } => {
                    self.last_error = Some(error.clone());
                    self.outbox
                        .push(ComposerEvent::AttachmentFailed { index, name, error });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::QueuedJobs;
    use crate::composer::host::InMemoryHost;
    use crate::composer::input::Key;
    use crate::speech::{NoRecognition, ScriptedHandle, ScriptedProvider};

    fn controller_with(
        host: InMemoryHost,
        config: ComposerConfig,
    ) -> (ComposerController<InMemoryHost>, ScriptedHandle, QueuedJobs) {
        let (provider, handle) = ScriptedProvider::pair();
        let (store, jobs) = AttachmentStore::with_queued_encoder(None);
        let controller = ComposerController::with_attachment_store(host, &provider, config, store);
        (controller, handle, jobs)
    }

    fn controller() -> (ComposerController<InMemoryHost>, ScriptedHandle, QueuedJobs) {
        controller_with(InMemoryHost::default(), ComposerConfig::default())
    }

    fn png(name: &str) -> ImageBlob {
        ImageBlob::from_bytes(name, Some("image/png".into()), name.as_bytes().to_vec())
    }

    #[test]
    fn test_initial_state() {
        let (controller, _handle, _jobs) = controller();
        assert!(!controller.is_listening());
        assert_eq!(controller.display_text(), "");
        assert!(controller.attachments().is_empty());
        assert!(!controller.can_submit());
        assert_eq!(controller.placeholder(), PROMPT_PLACEHOLDER);
    }

    #[test]
    fn test_type_and_submit() {
        let (mut controller, _handle, _jobs) = controller();
        controller.text_changed("hello");

        let outcome = controller.submit();
        assert_eq!(
            outcome,
            SubmitOutcome::Submitted(ComposedMessage::new("hello", vec![]))
        );
        assert_eq!(controller.host().submitted.len(), 1);
    }

    #[test]
    fn test_empty_submit_is_blocked() {
        let (mut controller, _handle, _jobs) = controller();
        controller.text_changed("   ");
        assert_eq!(controller.submit(), SubmitOutcome::Blocked(GateBlock::EmptyText));
        assert!(controller.host().submitted.is_empty());
    }

    #[test]
    fn test_dictation_commits_capitalized_transcript() {
        let (mut controller, handle, _jobs) = controller();
        controller.listen();
        assert!(controller.is_listening());
        assert_eq!(controller.placeholder(), LISTENING_PLACEHOLDER);

        handle.speak("hi there");
        controller.poll_events();
        assert_eq!(controller.display_text(), "Hi there");

        controller.listen();
        assert!(!controller.is_listening());
        assert_eq!(controller.host().input, "Hi there");
    }

    #[test]
    fn test_listening_hides_typed_text() {
        let (mut controller, handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.listen();

        // Nothing heard yet: the field shows the empty transcript, not "typed"
        assert_eq!(controller.display_text(), "");
        assert_eq!(controller.host().input, "typed");

        handle.speak("spoken");
        controller.poll_events();
        assert_eq!(controller.display_text(), "Spoken");
    }

    #[test]
    fn test_edits_while_listening_are_dropped() {
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.listen();
        controller.text_changed("typed and more");

        assert_eq!(controller.host().input, "typed");
        assert_eq!(controller.display_text(), "");
    }

    #[test]
    fn test_stop_with_empty_transcript_clears_input() {
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.listen();
        controller.listen();
        assert_eq!(controller.host().input, "");
    }

    #[test]
    fn test_stop_with_empty_transcript_can_keep_typed_text() {
        let config = ComposerConfig::default().restore_typed_text();
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), config);
        controller.listen();
        controller.listen();
        assert_eq!(controller.host().input, "typed");
    }

    #[test]
    fn test_end_after_commit_does_not_commit_twice() {
        let (provider, handle) = ScriptedProvider::pair();
        let provider = provider.with_manual_end();
        let (store, _jobs) = AttachmentStore::with_queued_encoder(None);
        let mut controller = ComposerController::with_attachment_store(
            InMemoryHost::default(),
            &provider,
            ComposerConfig::default(),
            store,
        );

        controller.listen();
        handle.speak("first take");
        controller.poll_events();
        controller.listen();
        assert_eq!(controller.host().input, "First take");
        controller.poll_events();

        // User edits the committed text before the engine confirms the stop
        controller.text_changed("First take, edited");
        handle.end();
        let events = controller.poll_events();

        assert_eq!(controller.host().input, "First take, edited");
        assert!(events.contains(&ComposerEvent::ListeningEnded { requested: true }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ComposerEvent::TranscriptCommitted(_))));
    }

    #[test]
    fn test_engine_auto_stop_keeps_typed_draft() {
        let (mut controller, handle, _jobs) =
            controller_with(InMemoryHost::with_input("my typed draft"), ComposerConfig::default());
        controller.listen();
        handle.speak("uh");
        handle.end();

        let events = controller.poll_events();
        assert!(!controller.is_listening());
        assert_eq!(controller.host().input, "my typed draft");
        assert_eq!(controller.display_text(), "my typed draft");
        assert!(events.contains(&ComposerEvent::ListeningEnded { requested: false }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ComposerEvent::TranscriptCommitted(_))));
    }

    #[test]
    fn test_engine_auto_stop_commits_when_enabled() {
        let config = ComposerConfig::default().commit_engine_end_transcript();
        let (mut controller, handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), config);
        controller.listen();
        handle.speak("auto stopped");
        handle.end();

        let events = controller.poll_events();
        assert!(!controller.is_listening());
        assert_eq!(controller.host().input, "Auto stopped");
        assert!(events.contains(&ComposerEvent::ListeningEnded { requested: false }));
    }

    #[test]
    fn test_engine_auto_stop_without_speech_keeps_typed_text() {
        let config = ComposerConfig::default().commit_engine_end_transcript();
        let (mut controller, handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), config);
        controller.listen();
        handle.end();
        controller.poll_events();
        assert_eq!(controller.host().input, "typed");
    }

    #[test]
    fn test_loading_forces_commit() {
        let (mut controller, handle, _jobs) = controller();
        controller.listen();
        handle.speak("send this");

        controller.set_loading(true);
        assert!(!controller.is_listening());
        assert_eq!(controller.host().input, "Send this");
        assert!(!controller.can_submit());
    }

    #[test]
    fn test_loading_without_listening_keeps_input() {
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.set_loading(true);
        assert_eq!(controller.host().input, "typed");
    }

    #[test]
    fn test_cannot_start_listening_while_sending() {
        let (mut controller, handle, _jobs) = controller();
        controller.set_loading(true);
        controller.listen();
        assert!(!controller.is_listening());
        assert_eq!(handle.starts(), 0);
    }

    #[test]
    fn test_enter_submits_and_prevents_newline() {
        let (mut controller, _handle, _jobs) = controller();
        controller.text_changed("hello");

        let outcome = controller.key_pressed(KeyPress::enter());
        assert!(outcome.prevent_default);
        assert!(outcome.submitted);

        let outcome = controller.key_pressed(KeyPress::shift_enter());
        assert_eq!(outcome, KeyOutcome::default());

        let outcome = controller.key_pressed(KeyPress::new(Key::Char('x'), false));
        assert!(!outcome.prevent_default);
    }

    #[test]
    fn test_enter_with_closed_gate_still_prevents_newline() {
        let (mut controller, _handle, _jobs) = controller();
        let outcome = controller.key_pressed(KeyPress::enter());
        assert!(outcome.prevent_default);
        assert!(!outcome.submitted);
    }

    #[test]
    fn test_submit_blocked_while_listening() {
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.listen();
        assert_eq!(controller.submit(), SubmitOutcome::Blocked(GateBlock::Listening));
    }

    #[test]
    fn test_stop_forwards_only_while_sending() {
        let (mut controller, _handle, jobs) = controller();
        controller.files_dropped(vec![png("a")]);
        controller.stop();
        assert_eq!(controller.host().stop_requests, 0);

        controller.set_loading(true);
        controller.stop();
        assert_eq!(controller.host().stop_requests, 1);
        assert_eq!(controller.attachments().len(), 1);
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_submit_includes_published_images() {
        let (mut controller, _handle, jobs) = controller();
        controller.files_dropped(vec![png("a"), png("b")]);
        jobs.complete_all();
        controller.text_changed("look");

        let outcome = controller.submit();
        let SubmitOutcome::Submitted(message) = outcome else {
            panic!("expected submission");
        };
        assert_eq!(
            message.images,
            vec![
                "data:image/png;base64,YQ==".to_string(),
                "data:image/png;base64,Yg==".to_string(),
            ]
        );
    }

    #[test]
    fn test_picker_filters_non_images() {
        let (mut controller, _handle, _jobs) = controller();
        let text = ImageBlob::from_bytes("notes.txt", Some("text/plain".into()), b"x".to_vec());

        assert_eq!(controller.files_selected(vec![png("a"), text.clone()]), 1);
        // Drops are not filtered
        assert_eq!(controller.files_dropped(vec![text]), 1);
        assert_eq!(controller.attachments().len(), 2);
    }

    #[test]
    fn test_remove_attachment_out_of_range() {
        let (mut controller, _handle, _jobs) = controller();
        controller.files_dropped(vec![png("a")]);
        assert!(!controller.remove_attachment(3));
        assert!(controller.remove_attachment(0));
        assert!(controller.attachments().is_empty());
    }

    #[test]
    fn test_removed_attachment_is_not_sent_while_reencoding() {
        let (mut controller, _handle, jobs) =
            controller_with(InMemoryHost::with_input("look"), ComposerConfig::default());
        controller.files_dropped(vec![png("a"), png("secret")]);
        jobs.complete_all();
        controller.poll_events();

        controller.remove_attachment(1);
        assert!(controller.attachments().is_encoding());

        let SubmitOutcome::Submitted(message) = controller.submit() else {
            panic!("expected submission");
        };
        assert_eq!(message.images, vec!["data:image/png;base64,YQ==".to_string()]);

        let view = controller.view();
        assert_eq!(view.attachments.len(), 1);
        assert_eq!(view.attachments[0].name, "a");
        assert_eq!(
            view.attachments[0].added_at,
            controller.attachments().entries()[0].added_at
        );
    }

    #[test]
    fn test_failed_attachment_stays_visible() {
        let (mut controller, _handle, jobs) = controller();
        controller.files_dropped(vec![png("a"), png("b")]);
        let generation = controller.attachments().generation();
        jobs.complete(generation, 0);
        jobs.fail(generation, 1, "corrupt");

        let events = controller.poll_events();
        assert!(events.iter().any(|e| matches!(
            e,
            ComposerEvent::AttachmentFailed { index: 1, .. }
        )));

        let view = controller.view();
        assert_eq!(view.attachments.len(), 2);
        assert!(view.attachments[0].data_uri.is_some());
        assert!(view.attachments[1].error.is_some());
        assert!(matches!(
            controller.last_error(),
            Some(ComposerError::EncodingFailure(_))
        ));
    }

    #[test]
    fn test_without_capability() {
        let (store, _jobs) = AttachmentStore::with_queued_encoder(None);
        let mut controller = ComposerController::with_attachment_store(
            InMemoryHost::with_input("typed"),
            &NoRecognition,
            ComposerConfig::default(),
            store,
        );

        assert!(!controller.voice_available());
        assert!(!controller.view().mic_enabled);
        controller.listen();
        assert!(!controller.is_listening());
        assert!(matches!(
            controller.last_error(),
            Some(ComposerError::CapabilityUnavailable(_))
        ));
        // Everything else still works
        assert!(controller.submit().is_submitted());
    }

    #[test]
    fn test_view_while_sending() {
        let (mut controller, _handle, _jobs) =
            controller_with(InMemoryHost::with_input("typed"), ComposerConfig::default());
        controller.set_loading(true);

        let view = controller.view();
        assert!(view.stop_visible);
        assert!(!view.mic_enabled);
        assert!(!view.send_enabled);
        assert_eq!(view.text, "typed");
    }

    #[test]
    fn test_drop_stops_engine() {
        let (mut controller, handle, _jobs) = controller();
        controller.listen();
        drop(controller);
        assert_eq!(handle.stops(), 1);
    }
}
