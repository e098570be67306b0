pub mod api;
pub mod chat;
pub mod chunker;
pub mod config;
pub mod controller;
pub mod error;
pub mod language;
pub mod nft;
pub mod session;
pub mod state;
pub mod status;
pub mod voice_input;
pub mod voice_output;

// Re-export main types for convenience
pub use api::NftApiClient;
pub use chat::{ChatBackend, ChatClient, ChatRequest};
pub use chunker::{split_into_chunks, DEFAULT_MAX_CHUNK_LEN};
pub use config::Config;
pub use controller::{ConversationState, Controller, ControllerOptions, StatusSnapshot};
pub use error::{ApiError, SpeechError};
pub use language::Language;
pub use nft::{Collection, Nft, NftSummary, Trait};
pub use session::{Session, SessionHandle, SessionUpdate};
pub use state::{ChatMessage, ChatRole};
pub use status::Status;
pub use voice_input::{RecognitionSink, SpeechRecognizer, VoiceInput};
pub use voice_output::{select_voice, SpeechSynthesizer, Utterance, Voice, VoiceOutput};
