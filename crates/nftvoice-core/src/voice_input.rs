//! Single-shot speech recognition sessions

use crate::error::SpeechError;
use crate::language::Language;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Result(String),
    Ended,
    Error(String),
}

/// A recognition event tagged with the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionNotice {
    pub session: u64,
    pub event: RecognitionEvent,
}

/// Handed to the recognizer for one session. Only the first `result` of a
/// session is forwarded.
#[derive(Clone)]
pub struct RecognitionSink {
    session: u64,
    tx: mpsc::UnboundedSender<RecognitionNotice>,
    delivered: Arc<AtomicBool>,
}

impl RecognitionSink {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn started(&self) {
        self.send(RecognitionEvent::Started);
    }

    pub fn result(&self, transcript: impl Into<String>) {
        if self.delivered.swap(true, Ordering::SeqCst) {
            debug!(session = self.session, "dropping extra recognition result");
            return;
        }
        self.send(RecognitionEvent::Result(transcript.into()));
    }

    pub fn ended(&self) {
        self.send(RecognitionEvent::Ended);
    }

    pub fn error(&self, error: impl Into<String>) {
        self.send(RecognitionEvent::Error(error.into()));
    }

    fn send(&self, event: RecognitionEvent) {
        // The receiver is gone only once the session has shut down
        let _ = self.tx.send(RecognitionNotice {
            session: self.session,
            event,
        });
    }
}

/// Platform speech-recognition capability. Sessions are non-continuous and
/// report final results only.
pub trait SpeechRecognizer: Send + 'static {
    /// Begin listening in `language`; report progress through `sink`.
    fn start(&mut self, language: Language, sink: RecognitionSink) -> Result<(), SpeechError>;

    /// Stop listening. The platform still reports `ended` (and possibly a result).
    fn stop(&mut self);
}

pub struct VoiceInput<R> {
    recognizer: R,
    tx: mpsc::UnboundedSender<RecognitionNotice>,
    next_session: u64,
    current: Option<u64>,
}

impl<R: SpeechRecognizer> VoiceInput<R> {
    pub fn new(recognizer: R, tx: mpsc::UnboundedSender<RecognitionNotice>) -> Self {
        Self {
            recognizer,
            tx,
            next_session: 1,
            current: None,
        }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Start a new session, superseding any previous one.
    pub fn start(&mut self, language: Language) -> Result<u64, SpeechError> {
        let session = self.next_session;
        self.next_session += 1;
        self.current = Some(session);

        let sink = RecognitionSink {
            session,
            tx: self.tx.clone(),
            delivered: Arc::new(AtomicBool::new(false)),
        };
        debug!(session, language = language.tag(), "starting recognition");
        if let Err(e) = self.recognizer.start(language, sink) {
            self.current = None;
            return Err(e);
        }
        Ok(session)
    }

    pub fn stop(&mut self) {
        if self.current.is_some() {
            self.recognizer.stop();
        }
    }

    /// Whether a notice belongs to the live session. Ending or erroring
    /// closes the session.
    pub fn accept(&mut self, notice: &RecognitionNotice) -> bool {
        if self.current != Some(notice.session) {
            debug!(session = notice.session, "ignoring event from stale recognition session");
            return false;
        }
        if matches!(notice.event, RecognitionEvent::Ended | RecognitionEvent::Error(_)) {
            self.current = None;
        }
        true
    }

    /// Abandon the live session without waiting for its events.
    pub fn abandon(&mut self) {
        if self.current.take().is_some() {
            self.recognizer.stop();
        }
    }
}
