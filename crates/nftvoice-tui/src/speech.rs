//! Terminal stand-ins for the platform speech capabilities
//!
//! Recognition is keyboard dictation: starting a session opens an input
//! line and the typed text becomes the transcript. Synthesis shows each
//! utterance in the UI for roughly as long as it would take to say it.

use async_trait::async_trait;
use nftvoice_core::{Language, RecognitionSink, SpeechError, SpeechRecognizer, SpeechSynthesizer, Utterance, Voice};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::input::TextInput;
use crate::tui::AppEvent;

/// Speaking pace at rate 1.0
const CHARS_PER_SECOND: f32 = 15.0;

pub enum SpeechEvent {
    DictationStarted { sink: RecognitionSink, language: Language },
    DictationStopped,
    Speaking { text: String, voice: Option<String> },
    Cancelled,
}

impl fmt::Debug for SpeechEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechEvent::DictationStarted { sink, language } => f
                .debug_struct("DictationStarted")
                .field("session", &sink.session())
                .field("language", language)
                .finish(),
            SpeechEvent::DictationStopped => write!(f, "DictationStopped"),
            SpeechEvent::Speaking { text, voice } => f
                .debug_struct("Speaking")
                .field("text", text)
                .field("voice", voice)
                .finish(),
            SpeechEvent::Cancelled => write!(f, "Cancelled"),
        }
    }
}

pub struct KeyboardRecognizer {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl KeyboardRecognizer {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl SpeechRecognizer for KeyboardRecognizer {
    fn start(&mut self, language: Language, sink: RecognitionSink) -> Result<(), SpeechError> {
        self.tx
            .send(AppEvent::Speech(SpeechEvent::DictationStarted { sink, language }))
            .map_err(|_| SpeechError::Unavailable("terminal input is closed".to_string()))
    }

    fn stop(&mut self) {
        let _ = self.tx.send(AppEvent::Speech(SpeechEvent::DictationStopped));
    }
}

/// One open dictation session: the input line plus where to report it.
pub struct Dictation {
    sink: RecognitionSink,
    pub language: Language,
    pub line: TextInput,
}

impl Dictation {
    pub fn begin(sink: RecognitionSink, language: Language) -> Self {
        sink.started();
        Self {
            sink,
            language,
            line: TextInput::default(),
        }
    }

    /// Finish the session, reporting the typed text if there is any.
    pub fn finish(self) {
        let text = self.line.text.trim();
        if !text.is_empty() {
            self.sink.result(text);
        }
        self.sink.ended();
    }

    /// Finish the session without a result.
    pub fn abort(self) {
        self.sink.ended();
    }
}

pub struct TerminalSynthesizer {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl TerminalSynthesizer {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

pub fn speaking_time(utterance: &Utterance) -> Duration {
    let chars = utterance.text.chars().count() as f32;
    let rate = if utterance.rate > 0.0 { utterance.rate } else { 1.0 };
    Duration::from_secs_f32(chars / (CHARS_PER_SECOND * rate))
}

#[async_trait]
impl SpeechSynthesizer for TerminalSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("Terminal US English", "en-US"),
            Voice::new("Terminal español", "es-ES"),
        ]
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let duration = speaking_time(&utterance);
        self.tx
            .send(AppEvent::Speech(SpeechEvent::Speaking {
                text: utterance.text,
                voice: utterance.voice.map(|v| v.name),
            }))
            .map_err(|_| SpeechError::Unavailable("terminal output is closed".to_string()))?;
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn cancel_all(&self) {
        let _ = self.tx.send(AppEvent::Speech(SpeechEvent::Cancelled));
    }
}
