use serde::{Deserialize, Serialize};

/// Session language. Governs recognition locale, synthesis locale and the
/// wording of every status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "es-ES")]
    Spanish,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Spanish => "es-ES",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en-us" | "en" => Some(Language::English),
            "es-es" | "es" => Some(Language::Spanish),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![Language::English, Language::Spanish]
    }

    /// Two-letter label shown on the language toggle.
    pub fn short_label(&self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Spanish => "ES",
        }
    }

    pub fn toggle(&self) -> Language {
        match self {
            Language::English => Language::Spanish,
            Language::Spanish => Language::English,
        }
    }

    /// Voice names tried in order before falling back to any voice of the locale.
    pub fn preferred_voices(&self) -> &'static [&'static str] {
        match self {
            Language::English => &["Google US English", "Samantha", "Alex"],
            Language::Spanish => &["Google español", "Monica", "Juan"],
        }
    }

    pub fn speech_rate(&self) -> f32 {
        1.1
    }

    pub fn speech_pitch(&self) -> f32 {
        match self {
            Language::English => 1.1,
            Language::Spanish => 1.2,
        }
    }

    /// Spoken when the chat backend cannot be reached.
    pub fn apology(&self) -> &'static str {
        match self {
            Language::English => {
                "Sorry, I had trouble processing your message. Could you try again?"
            }
            Language::Spanish => {
                "Lo siento, tuve un problema al procesar tu mensaje. ¿Podrías intentarlo de nuevo?"
            }
        }
    }
}
