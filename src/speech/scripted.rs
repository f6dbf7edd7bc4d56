//! Scripted recognition engine
//!
//! An in-process engine whose results are pushed by code through a
//! [`ScriptedHandle`]. Used by the test suites and by the demo binary to
//! simulate dictation without a microphone.

use crate::speech::engine::{EngineEvent, RecognitionEngine, RecognitionProvider, SpeechOptions};
use crate::{ComposerError, Result};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct ScriptedState {
    events: Option<Sender<EngineEvent>>,
    configured: Option<SpeechOptions>,
    grammar: Option<String>,
    segments: Vec<String>,
    starts: usize,
    stops: usize,
    running: bool,
    fail_next_start: Option<String>,
}

impl ScriptedState {
    fn send(&self, event: EngineEvent) {
        match &self.events {
            // The receiver is gone once the owning session is dropped
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => debug!("Scripted event dropped: no engine created"),
        }
    }
}

/// Drives a scripted engine from test or demo code
#[derive(Clone, Debug, Default)]
pub struct ScriptedHandle {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedHandle {
    /// Append a result segment and deliver the session's full result list
    pub fn speak(&self, segment: &str) {
        let mut state = self.state.lock();
        state.segments.push(segment.to_string());
        let results = state.segments.clone();
        state.send(EngineEvent::Results(results));
    }

    /// Deliver an explicit result list (replacing semantics)
    pub fn emit_results(&self, segments: &[&str]) {
        let mut state = self.state.lock();
        state.segments = segments.iter().map(|s| s.to_string()).collect();
        let results = state.segments.clone();
        state.send(EngineEvent::Results(results));
    }

    /// Report a non-fatal engine error
    pub fn error(&self, reason: &str) {
        self.state.lock().send(EngineEvent::Error(reason.to_string()));
    }

    /// End the session from the engine side (silence timeout, device loss)
    pub fn end(&self) {
        let mut state = self.state.lock();
        state.running = false;
        state.segments.clear();
        state.send(EngineEvent::End);
    }

    /// Make the next `start()` fail synchronously
    pub fn fail_next_start(&self, reason: &str) {
        self.state.lock().fail_next_start = Some(reason.to_string());
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Options the engine was configured with
    pub fn configured(&self) -> Option<SpeechOptions> {
        self.state.lock().configured.clone()
    }

    /// Grammar accepted by the engine, if any
    pub fn grammar(&self) -> Option<String> {
        self.state.lock().grammar.clone()
    }
}

/// Provider that hands out scripted engines sharing one handle
#[derive(Clone, Debug)]
pub struct ScriptedProvider {
    handle: ScriptedHandle,
    supports_grammar: bool,
    end_on_stop: bool,
}

impl ScriptedProvider {
    /// A provider plus the handle that drives its engines
    pub fn pair() -> (Self, ScriptedHandle) {
        let handle = ScriptedHandle::default();
        let provider = Self {
            handle: handle.clone(),
            supports_grammar: false,
            end_on_stop: true,
        };
        (provider, handle)
    }

    /// Accept grammar hints
    pub fn with_grammar_support(mut self) -> Self {
        self.supports_grammar = true;
        self
    }

    /// Do not confirm `stop()` automatically; call [`ScriptedHandle::end`]
    pub fn with_manual_end(mut self) -> Self {
        self.end_on_stop = false;
        self
    }
}

impl RecognitionProvider for ScriptedProvider {
    fn create(&self, events: Sender<EngineEvent>) -> Option<Box<dyn RecognitionEngine>> {
        self.handle.state.lock().events = Some(events);
        Some(Box::new(ScriptedEngine {
            handle: self.handle.clone(),
            supports_grammar: self.supports_grammar,
            end_on_stop: self.end_on_stop,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedEngine {
    handle: ScriptedHandle,
    supports_grammar: bool,
    end_on_stop: bool,
}

impl RecognitionEngine for ScriptedEngine {
    fn configure(&mut self, options: &SpeechOptions) {
        self.handle.state.lock().configured = Some(options.clone());
    }

    fn set_grammar(&mut self, grammar: &str, _weight: f32) -> bool {
        if !self.supports_grammar {
            return false;
        }
        self.handle.state.lock().grammar = Some(grammar.to_string());
        true
    }

    fn start(&mut self) -> Result<()> {
        let mut state = self.handle.state.lock();
        if let Some(reason) = state.fail_next_start.take() {
            return Err(ComposerError::EngineError(reason));
        }
        state.starts += 1;
        state.running = true;
        state.segments.clear();
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.handle.state.lock();
        state.stops += 1;
        if self.end_on_stop && state.running {
            state.running = false;
            state.segments.clear();
            state.send(EngineEvent::End);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_speak_accumulates_segments() {
        let (provider, handle) = ScriptedProvider::pair();
        let (tx, rx) = unbounded();
        let mut engine = provider.create(tx).unwrap();
        engine.start().unwrap();

        handle.speak("one");
        handle.speak(" two");

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::Results(vec!["one".into()]));
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::Results(vec!["one".into(), " two".into()])
        );
    }

    #[test]
    fn test_stop_confirms_with_end() {
        let (provider, handle) = ScriptedProvider::pair();
        let (tx, rx) = unbounded();
        let mut engine = provider.create(tx).unwrap();
        engine.start().unwrap();
        engine.stop();

        assert!(!handle.is_running());
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::End);
    }

    #[test]
    fn test_manual_end_waits() {
        let (provider, handle) = ScriptedProvider::pair();
        let provider = provider.with_manual_end();
        let (tx, rx) = unbounded();
        let mut engine = provider.create(tx).unwrap();
        engine.start().unwrap();
        engine.stop();

        assert!(rx.try_recv().is_err());
        handle.end();
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::End);
    }
}
