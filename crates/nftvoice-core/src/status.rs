use crate::language::Language;

/// What the status line says, independent of wording. Rendered in the
/// session language on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Listening,
    YouSaid(String),
    Thinking,
    Speaking,
    SelectNftFirst,
    ReadyToChat(String),
    RecognitionError(String),
    NftLoadError(String),
}

impl Status {
    pub fn text(&self, language: Language) -> String {
        let spanish = language == Language::Spanish;
        match self {
            Status::Ready if spanish => "Listo para escuchar...".to_string(),
            Status::Ready => "Ready to listen...".to_string(),
            Status::Listening if spanish => "Escuchando...".to_string(),
            Status::Listening => "Listening...".to_string(),
            Status::YouSaid(t) if spanish => format!("Has dicho: {}", t),
            Status::YouSaid(t) => format!("You said: {}", t),
            Status::Thinking if spanish => "Pensando...".to_string(),
            Status::Thinking => "Thinking...".to_string(),
            Status::Speaking if spanish => "NFT está hablando...".to_string(),
            Status::Speaking => "NFT is speaking...".to_string(),
            Status::SelectNftFirst if spanish => "¡Primero selecciona un NFT para hablar!".to_string(),
            Status::SelectNftFirst => "Please select an NFT to talk to first!".to_string(),
            Status::ReadyToChat(name) if spanish => format!("¡Listo para charlar con {}!", name),
            Status::ReadyToChat(name) => format!("Ready to chat with {}!", name),
            Status::RecognitionError(e) => format!("Error: {}", e),
            Status::NftLoadError(_) if spanish => {
                "Error al cargar los datos del NFT. Inténtalo de nuevo.".to_string()
            }
            Status::NftLoadError(_) => "Error loading NFT data. Please try again.".to_string(),
        }
    }
}

/// Label of the talk button
pub fn talk_label(language: Language, recording: bool) -> &'static str {
    match (language, recording) {
        (Language::English, false) => "Press to Talk",
        (Language::English, true) => "Stop",
        (Language::Spanish, false) => "Presiona para Hablar",
        (Language::Spanish, true) => "Detener",
    }
}
