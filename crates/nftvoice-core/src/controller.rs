//! Conversation turn state machine
//!
//! The controller owns the session language, the selected NFT and the
//! recording flag. It reacts to discrete [`Event`]s and answers with the
//! [`Command`]s the caller must carry out; it never touches a platform
//! capability itself, so every transition can be exercised directly.

use crate::chat::ChatRequest;
use crate::chunker::{split_into_chunks, DEFAULT_MAX_CHUNK_LEN};
use crate::language::Language;
use crate::nft::Nft;
use crate::state::ChatMessage;
use crate::status::{talk_label, Status};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RecordPressed,
    RecognitionStarted,
    RecognitionResult(String),
    RecognitionEnded,
    RecognitionError(String),
    ReplyReady { turn: u64, text: String },
    SpeechFinished { turn: u64 },
    LanguageToggled,
    NftSelected(Nft),
    NftLoadFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartRecognition { language: Language },
    StopRecognition,
    /// Drop the live recognition session without waiting for its events
    AbandonRecognition,
    CancelSpeech,
    SendChat { turn: u64, request: ChatRequest },
    Speak { turn: u64, chunks: Vec<String>, language: Language },
    AppendMessage(ChatMessage),
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub language: Language,
    pub max_chunk_len: usize,
    pub persona: Option<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            persona: None,
        }
    }
}

/// Everything a front-end needs to draw the controls and status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ConversationState,
    pub language: Language,
    pub recording: bool,
    pub status_text: String,
    pub talk_label: &'static str,
    pub nft_name: Option<String>,
}

pub struct Controller {
    state: ConversationState,
    language: Language,
    nft: Option<Nft>,
    recording: bool,
    status: Status,
    turn: u64,
    max_chunk_len: usize,
    persona: Option<String>,
}

impl Controller {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            state: ConversationState::Idle,
            language: options.language,
            nft: None,
            recording: false,
            status: Status::Ready,
            turn: 0,
            max_chunk_len: options.max_chunk_len,
            persona: options.persona,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn nft(&self) -> Option<&Nft> {
        self.nft.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_text(&self) -> String {
        self.status.text(self.language)
    }

    /// Id of the turn currently in flight (or the last one).
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            language: self.language,
            recording: self.recording,
            status_text: self.status_text(),
            talk_label: talk_label(self.language, self.recording),
            nft_name: self.nft.as_ref().map(|n| n.display_name()),
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let before = self.state;
        let commands = match event {
            Event::RecordPressed => self.on_record_pressed(),
            Event::RecognitionStarted => {
                self.recording = true;
                Vec::new()
            }
            Event::RecognitionResult(transcript) => self.on_transcript(transcript),
            Event::RecognitionEnded => {
                self.recording = false;
                if self.state == ConversationState::Listening {
                    self.enter(ConversationState::Idle, Status::Ready);
                }
                Vec::new()
            }
            Event::RecognitionError(error) => {
                warn!(%error, "speech recognition error");
                self.recording = false;
                if self.state == ConversationState::Listening {
                    self.enter(ConversationState::Idle, Status::RecognitionError(error));
                }
                Vec::new()
            }
            Event::ReplyReady { turn, text } => self.on_reply(turn, text),
            Event::SpeechFinished { turn } => {
                if self.state == ConversationState::Speaking && turn == self.turn {
                    self.enter(ConversationState::Idle, Status::Ready);
                } else {
                    debug!(turn, current = self.turn, "ignoring speech completion from an old turn");
                }
                Vec::new()
            }
            Event::LanguageToggled => {
                self.language = self.language.toggle();
                info!(language = self.language.tag(), "language changed");
                Vec::new()
            }
            Event::NftSelected(nft) => self.on_nft_selected(nft),
            Event::NftLoadFailed(reason) => {
                warn!(%reason, "failed to load NFT metadata");
                let message = ChatMessage::system(format!("Could not load NFT metadata: {}", reason));
                self.status = Status::NftLoadError(reason);
                vec![Command::AppendMessage(message)]
            }
        };
        if before != self.state {
            debug!(from = ?before, to = ?self.state, turn = self.turn, "conversation state changed");
        }
        commands
    }

    fn enter(&mut self, state: ConversationState, status: Status) {
        self.state = state;
        self.status = status;
    }

    fn on_record_pressed(&mut self) -> Vec<Command> {
        if self.nft.is_none() {
            self.status = Status::SelectNftFirst;
            return Vec::new();
        }

        match self.state {
            ConversationState::Idle => self.begin_turn(Vec::new()),
            ConversationState::Speaking => self.begin_turn(vec![Command::CancelSpeech]),
            ConversationState::Listening => vec![Command::StopRecognition],
            ConversationState::Processing => {
                debug!(turn = self.turn, "reply pending, ignoring record request");
                Vec::new()
            }
        }
    }

    fn begin_turn(&mut self, mut commands: Vec<Command>) -> Vec<Command> {
        self.turn += 1;
        self.enter(ConversationState::Listening, Status::Listening);
        commands.push(Command::StartRecognition {
            language: self.language,
        });
        commands
    }

    fn on_transcript(&mut self, transcript: String) -> Vec<Command> {
        if self.state != ConversationState::Listening {
            debug!("ignoring transcript outside of a listening session");
            return Vec::new();
        }
        let Some(nft) = self.nft.as_ref() else {
            self.enter(ConversationState::Idle, Status::SelectNftFirst);
            return Vec::new();
        };

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            self.enter(ConversationState::Idle, Status::Ready);
            return Vec::new();
        }

        let request = ChatRequest {
            user_input: transcript.clone(),
            language: self.language,
            nft_id: Some(nft.token_id.clone()),
            context: self
                .persona
                .clone()
                .or_else(|| nft.generated_personality.clone()),
        };
        self.enter(ConversationState::Processing, Status::YouSaid(transcript.clone()));

        vec![
            Command::AppendMessage(ChatMessage::user(transcript)),
            Command::SendChat {
                turn: self.turn,
                request,
            },
        ]
    }

    fn on_reply(&mut self, turn: u64, text: String) -> Vec<Command> {
        if self.state != ConversationState::Processing || turn != self.turn {
            info!(turn, current = self.turn, "discarding stale chat reply");
            return Vec::new();
        }

        let chunks = split_into_chunks(&text, self.max_chunk_len);
        let mut commands = vec![
            Command::AppendMessage(ChatMessage::nft(text)),
            Command::CancelSpeech,
        ];
        if chunks.is_empty() {
            self.enter(ConversationState::Idle, Status::Ready);
            return commands;
        }

        self.enter(ConversationState::Speaking, Status::Speaking);
        commands.push(Command::Speak {
            turn,
            chunks,
            language: self.language,
        });
        commands
    }

    fn on_nft_selected(&mut self, nft: Nft) -> Vec<Command> {
        let mut commands = Vec::new();
        match self.state {
            ConversationState::Idle => {}
            ConversationState::Listening => commands.push(Command::AbandonRecognition),
            ConversationState::Processing => {}
            ConversationState::Speaking => commands.push(Command::CancelSpeech),
        }
        if self.state != ConversationState::Idle {
            // Whatever the old turn produces from here on is stale
            self.turn += 1;
            self.recording = false;
        }

        info!(token_id = %nft.token_id, "NFT selected");
        let name = nft.display_name();
        self.nft = Some(nft);
        self.enter(ConversationState::Idle, Status::ReadyToChat(name));
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nft(id: &str) -> Nft {
        Nft {
            token_id: id.to_string(),
            name: Some(format!("Boy #{}", id)),
            image_url: None,
            attributes: Vec::new(),
            generated_personality: None,
        }
    }

    fn ready_controller() -> Controller {
        let mut controller = Controller::new(ControllerOptions::default());
        controller.handle(Event::NftSelected(nft("5")));
        controller
    }

    /// Drive a controller to `Processing` and return the chat turn id.
    fn to_processing(controller: &mut Controller, transcript: &str) -> u64 {
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionStarted);
        let commands = controller.handle(Event::RecognitionResult(transcript.to_string()));
        controller.handle(Event::RecognitionEnded);
        commands
            .iter()
            .find_map(|c| match c {
                Command::SendChat { turn, .. } => Some(*turn),
                _ => None,
            })
            .expect("chat request issued")
    }

    #[test]
    fn test_record_without_nft_stays_idle() {
        let mut controller = Controller::new(ControllerOptions::default());
        let commands = controller.handle(Event::RecordPressed);
        assert!(commands.is_empty());
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(controller.status(), &Status::SelectNftFirst);
        assert_eq!(controller.status_text(), "Please select an NFT to talk to first!");
    }

    #[test]
    fn test_full_turn() {
        let mut controller = ready_controller();
        assert_eq!(controller.status_text(), "Ready to chat with Boy #5!");

        let commands = controller.handle(Event::RecordPressed);
        assert_eq!(
            commands,
            vec![Command::StartRecognition {
                language: Language::English
            }]
        );
        assert_eq!(controller.state(), ConversationState::Listening);

        controller.handle(Event::RecognitionStarted);
        assert!(controller.is_recording());

        let commands = controller.handle(Event::RecognitionResult(" hello there ".to_string()));
        assert_eq!(controller.state(), ConversationState::Processing);
        assert_eq!(controller.status_text(), "You said: hello there");
        let turn = match &commands[1] {
            Command::SendChat { turn, request } => {
                assert_eq!(request.user_input, "hello there");
                assert_eq!(request.nft_id.as_deref(), Some("5"));
                assert_eq!(request.language, Language::English);
                *turn
            }
            other => panic!("unexpected command {:?}", other),
        };

        controller.handle(Event::RecognitionEnded);
        assert!(!controller.is_recording());
        assert_eq!(controller.state(), ConversationState::Processing);

        let commands = controller.handle(Event::ReplyReady {
            turn,
            text: "Hi! I love painting.".to_string(),
        });
        assert_eq!(controller.state(), ConversationState::Speaking);
        assert_eq!(controller.status_text(), "NFT is speaking...");
        assert_eq!(
            commands,
            vec![
                Command::AppendMessage(ChatMessage::nft("Hi! I love painting.")),
                Command::CancelSpeech,
                Command::Speak {
                    turn,
                    chunks: vec!["Hi! I love painting.".to_string()],
                    language: Language::English,
                },
            ]
        );

        controller.handle(Event::SpeechFinished { turn });
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(controller.status_text(), "Ready to listen...");
    }

    #[test]
    fn test_apology_reply_reaches_speaking() {
        let mut controller = ready_controller();
        let turn = to_processing(&mut controller, "are you there?");
        controller.handle(Event::ReplyReady {
            turn,
            text: Language::English.apology().to_string(),
        });
        assert_eq!(controller.state(), ConversationState::Speaking);
    }

    #[test]
    fn test_recognition_end_without_result_returns_idle() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionStarted);
        controller.handle(Event::RecognitionEnded);
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(controller.status(), &Status::Ready);
    }

    #[test]
    fn test_recognition_error_is_surfaced() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionStarted);
        controller.handle(Event::RecognitionError("not-allowed".to_string()));
        assert_eq!(controller.state(), ConversationState::Idle);
        assert!(!controller.is_recording());
        assert_eq!(controller.status_text(), "Error: not-allowed");

        // Still usable afterwards
        let commands = controller.handle(Event::RecordPressed);
        assert_eq!(controller.state(), ConversationState::Listening);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_nft_load_failure_is_logged_and_keeps_selection() {
        let mut controller = ready_controller();
        let commands = controller.handle(Event::NftLoadFailed("404".to_string()));
        assert_eq!(
            commands,
            vec![Command::AppendMessage(ChatMessage::system(
                "Could not load NFT metadata: 404"
            ))]
        );
        assert_eq!(controller.status_text(), "Error loading NFT data. Please try again.");
        assert_eq!(controller.nft().map(|n| n.token_id.as_str()), Some("5"));
        assert_eq!(controller.state(), ConversationState::Idle);
    }

    #[test]
    fn test_record_while_listening_stops() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionStarted);
        let commands = controller.handle(Event::RecordPressed);
        assert_eq!(commands, vec![Command::StopRecognition]);
        assert_eq!(controller.state(), ConversationState::Listening);
    }

    #[test]
    fn test_blank_transcript_skips_chat() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        let commands = controller.handle(Event::RecognitionResult("   ".to_string()));
        assert!(commands.is_empty());
        assert_eq!(controller.state(), ConversationState::Idle);
    }

    #[test]
    fn test_record_while_processing_is_ignored() {
        let mut controller = ready_controller();
        to_processing(&mut controller, "hi");
        let commands = controller.handle(Event::RecordPressed);
        assert!(commands.is_empty());
        assert_eq!(controller.state(), ConversationState::Processing);
    }

    #[test]
    fn test_record_while_speaking_cancels_first() {
        let mut controller = ready_controller();
        let turn = to_processing(&mut controller, "tell me a story");
        controller.handle(Event::ReplyReady {
            turn,
            text: "Once upon a time.".to_string(),
        });

        let commands = controller.handle(Event::RecordPressed);
        assert_eq!(
            commands,
            vec![
                Command::CancelSpeech,
                Command::StartRecognition {
                    language: Language::English
                },
            ]
        );
        assert_eq!(controller.state(), ConversationState::Listening);

        // The cancelled sequence finishing late must not end the new turn
        controller.handle(Event::SpeechFinished { turn });
        assert_eq!(controller.state(), ConversationState::Listening);
    }

    #[test]
    fn test_stale_reply_is_discarded() {
        let mut controller = ready_controller();
        let turn = to_processing(&mut controller, "hi");
        controller.handle(Event::NftSelected(nft("9")));
        assert_eq!(controller.state(), ConversationState::Idle);

        let commands = controller.handle(Event::ReplyReady {
            turn,
            text: "Reply for the old NFT.".to_string(),
        });
        assert!(commands.is_empty());
        assert_eq!(controller.state(), ConversationState::Idle);
        assert_eq!(controller.status_text(), "Ready to chat with Boy #9!");
    }

    #[test]
    fn test_selecting_nft_while_listening_abandons_recognition() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionStarted);
        let commands = controller.handle(Event::NftSelected(nft("6")));
        assert_eq!(commands, vec![Command::AbandonRecognition]);
        assert!(!controller.is_recording());
        assert_eq!(controller.nft().map(|n| n.token_id.as_str()), Some("6"));
    }

    #[test]
    fn test_language_toggle_twice_restores_status() {
        let mut controller = ready_controller();
        controller.handle(Event::RecordPressed);
        controller.handle(Event::RecognitionEnded);
        let original_text = controller.status_text();
        let original_language = controller.language();

        controller.handle(Event::LanguageToggled);
        assert_eq!(controller.language(), Language::Spanish);
        assert_eq!(controller.status_text(), "Listo para escuchar...");
        assert_eq!(controller.snapshot().talk_label, "Presiona para Hablar");

        controller.handle(Event::LanguageToggled);
        assert_eq!(controller.language(), original_language);
        assert_eq!(controller.status_text(), original_text);
    }

    #[test]
    fn test_spanish_turn_uses_spanish_everywhere() {
        let mut controller = ready_controller();
        controller.handle(Event::LanguageToggled);
        let commands = controller.handle(Event::RecordPressed);
        assert_eq!(
            commands,
            vec![Command::StartRecognition {
                language: Language::Spanish
            }]
        );
        assert_eq!(controller.status_text(), "Escuchando...");
    }

    #[test]
    fn test_long_reply_is_chunked() {
        let mut controller = Controller::new(ControllerOptions {
            max_chunk_len: 20,
            ..ControllerOptions::default()
        });
        controller.handle(Event::NftSelected(nft("1")));
        let turn = to_processing(&mut controller, "how are you?");
        let commands = controller.handle(Event::ReplyReady {
            turn,
            text: "Hi there. How are you today? I am fine.".to_string(),
        });
        let chunks = commands.iter().find_map(|c| match c {
            Command::Speak { chunks, .. } => Some(chunks.clone()),
            _ => None,
        });
        assert_eq!(
            chunks,
            Some(vec![
                "Hi there.".to_string(),
                "How are you today?".to_string(),
                "I am fine.".to_string(),
            ])
        );
    }

    #[test]
    fn test_empty_reply_goes_idle() {
        let mut controller = ready_controller();
        let turn = to_processing(&mut controller, "hi");
        let commands = controller.handle(Event::ReplyReady {
            turn,
            text: "  ".to_string(),
        });
        assert!(!commands.iter().any(|c| matches!(c, Command::Speak { .. })));
        assert_eq!(controller.state(), ConversationState::Idle);
    }

    #[test]
    fn test_persona_is_sent_as_context() {
        let mut controller = Controller::new(ControllerOptions {
            persona: Some("You are a dreamy portrait.".to_string()),
            ..ControllerOptions::default()
        });
        controller.handle(Event::NftSelected(nft("2")));
        controller.handle(Event::RecordPressed);
        let commands = controller.handle(Event::RecognitionResult("hi".to_string()));
        match &commands[1] {
            Command::SendChat { request, .. } => {
                assert_eq!(request.context.as_deref(), Some("You are a dreamy portrait."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
