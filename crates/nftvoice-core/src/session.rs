//! Async driver for the conversation controller
//!
//! [`Session::run`] is the sole owner of the controller and of the speech
//! queue. Front-ends talk to it through a [`SessionHandle`] and watch the
//! [`SessionUpdate`] stream. Chat calls and speech playback run on their
//! own tasks and report back as controller events.

use crate::chat::{reply_or_apology, ChatBackend};
use crate::controller::{Command, Controller, ControllerOptions, Event, StatusSnapshot};
use crate::nft::Nft;
use crate::state::ChatMessage;
use crate::voice_input::{RecognitionEvent, RecognitionNotice, SpeechRecognizer, VoiceInput};
use crate::voice_output::{SpeechSynthesizer, VoiceOutput};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Status(StatusSnapshot),
    Message(ChatMessage),
}

enum Request {
    Event(Event),
    Shutdown,
}

/// Clonable front-end side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl SessionHandle {
    /// Toggle recording (start a turn, or stop listening).
    pub fn record(&self) -> bool {
        self.send(Event::RecordPressed)
    }

    pub fn toggle_language(&self) -> bool {
        self.send(Event::LanguageToggled)
    }

    pub fn select_nft(&self, nft: Nft) -> bool {
        self.send(Event::NftSelected(nft))
    }

    pub fn nft_load_failed(&self, reason: impl Into<String>) -> bool {
        self.send(Event::NftLoadFailed(reason.into()))
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Request::Shutdown);
    }

    fn send(&self, event: Event) -> bool {
        self.tx.send(Request::Event(event)).is_ok()
    }
}

pub struct Session<R, S, C> {
    controller: Controller,
    input: VoiceInput<R>,
    output: Arc<VoiceOutput<S>>,
    chat: Arc<C>,
    requests: mpsc::UnboundedReceiver<Request>,
    recognition: mpsc::UnboundedReceiver<RecognitionNotice>,
    completions_tx: mpsc::UnboundedSender<Event>,
    completions: mpsc::UnboundedReceiver<Event>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    speaking: Option<JoinHandle<()>>,
}

impl<R, S, C> Session<R, S, C>
where
    R: SpeechRecognizer,
    S: SpeechSynthesizer,
    C: ChatBackend,
{
    pub fn new(
        recognizer: R,
        synthesizer: S,
        chat: C,
        options: ControllerOptions,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (recognition_tx, recognition) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let session = Self {
            controller: Controller::new(options),
            input: VoiceInput::new(recognizer, recognition_tx),
            output: Arc::new(VoiceOutput::new(synthesizer)),
            chat: Arc::new(chat),
            requests,
            recognition,
            completions_tx,
            completions,
            updates,
            speaking: None,
        };
        (session, SessionHandle { tx: requests_tx }, updates_rx)
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Process events until shut down or every handle is dropped.
    pub async fn run(mut self) {
        info!(language = self.controller.language().tag(), "conversation session started");
        self.publish_status();

        loop {
            let event = tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Event(event)) => event,
                    Some(Request::Shutdown) | None => break,
                },
                Some(notice) = self.recognition.recv() => {
                    if !self.input.accept(&notice) {
                        continue;
                    }
                    match notice.event {
                        RecognitionEvent::Started => Event::RecognitionStarted,
                        RecognitionEvent::Result(transcript) => Event::RecognitionResult(transcript),
                        RecognitionEvent::Ended => Event::RecognitionEnded,
                        RecognitionEvent::Error(error) => Event::RecognitionError(error),
                    }
                },
                Some(event) = self.completions.recv() => event,
            };
            self.dispatch(event);
        }

        self.cancel_speech();
        self.input.abandon();
        info!("conversation session stopped");
    }

    fn dispatch(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for command in self.controller.handle(event) {
                if let Some(follow_up) = self.execute(command) {
                    pending.push_back(follow_up);
                }
            }
        }
        self.publish_status();
    }

    /// Carry out one command. Returns an event when the command failed
    /// synchronously and the controller has to hear about it.
    fn execute(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::StartRecognition { language } => {
                if let Err(e) = self.input.start(language) {
                    return Some(Event::RecognitionError(e.to_string()));
                }
            }
            Command::StopRecognition => self.input.stop(),
            Command::AbandonRecognition => self.input.abandon(),
            Command::CancelSpeech => self.cancel_speech(),
            Command::SendChat { turn, request } => {
                let chat = Arc::clone(&self.chat);
                let tx = self.completions_tx.clone();
                debug!(turn, "sending chat request");
                tokio::spawn(async move {
                    let text = reply_or_apology(chat.as_ref(), &request).await;
                    let _ = tx.send(Event::ReplyReady { turn, text });
                });
            }
            Command::Speak {
                turn,
                chunks,
                language,
            } => {
                // The synthesis queue is shared; never enqueue on top of old speech
                self.cancel_speech();
                let output = Arc::clone(&self.output);
                let generation = output.generation();
                let tx = self.completions_tx.clone();
                self.speaking = Some(tokio::spawn(async move {
                    if output.speak_all(&chunks, language, generation).await {
                        let _ = tx.send(Event::SpeechFinished { turn });
                    }
                }));
            }
            Command::AppendMessage(message) => {
                let _ = self.updates.send(SessionUpdate::Message(message));
            }
        }
        None
    }

    fn cancel_speech(&mut self) {
        if let Some(task) = self.speaking.take() {
            task.abort();
        }
        self.output.cancel();
    }

    fn publish_status(&self) {
        let _ = self
            .updates
            .send(SessionUpdate::Status(self.controller.snapshot()));
    }
}
