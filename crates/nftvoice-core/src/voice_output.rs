//! Sequential speech playback on top of a platform synthesizer

use crate::error::SpeechError;
use crate::language::Language;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// A voice offered by the synthesis platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 locale, e.g. "es-ES"
    pub locale: String,
}

impl Voice {
    pub fn new(name: &str, locale: &str) -> Self {
        Self {
            name: name.to_string(),
            locale: locale.to_string(),
        }
    }
}

/// One unit of synthesized speech
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: Language,
    /// `None` speaks with the platform default voice
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Platform speech-synthesis capability
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Voices currently available. May change over the lifetime of the platform.
    fn voices(&self) -> Vec<Voice>;

    /// Speak one utterance, resolving once it has finished playing.
    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Drop everything queued or playing.
    fn cancel_all(&self);
}

/// Pick the voice for `language`: an allow-listed name first, then any voice
/// of the locale, otherwise none.
pub fn select_voice(voices: &[Voice], language: Language) -> Option<&Voice> {
    let candidates: Vec<&Voice> = voices
        .iter()
        .filter(|v| v.locale.starts_with(language.tag()))
        .collect();

    for preferred in language.preferred_voices() {
        if let Some(voice) = candidates.iter().find(|v| v.name.contains(preferred)) {
            return Some(*voice);
        }
    }

    candidates.first().copied()
}

/// Plays chunk sequences one utterance at a time. Every [`VoiceOutput::cancel`]
/// starts a new playback generation; a sequence started under an older
/// generation stops before its next chunk.
pub struct VoiceOutput<S> {
    synthesizer: S,
    generation: AtomicU64,
}

impl<S: SpeechSynthesizer> VoiceOutput<S> {
    pub fn new(synthesizer: S) -> Self {
        Self {
            synthesizer,
            generation: AtomicU64::new(0),
        }
    }

    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Current playback generation, to be handed to [`VoiceOutput::speak_all`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn utterance(&self, text: &str, language: Language) -> Utterance {
        let voices = self.synthesizer.voices();
        Utterance {
            text: text.to_string(),
            language,
            voice: select_voice(&voices, language).cloned(),
            rate: language.speech_rate(),
            pitch: language.speech_pitch(),
            volume: 1.0,
        }
    }

    /// Speak every chunk in order, one at a time. A failed chunk is logged
    /// and playback moves on to the next one. Returns `false` when playback
    /// was cancelled before the last chunk finished.
    pub async fn speak_all(&self, chunks: &[String], language: Language, generation: u64) -> bool {
        for (i, chunk) in chunks.iter().enumerate() {
            if self.generation() != generation {
                debug!(chunk = i, total = chunks.len(), "playback cancelled");
                return false;
            }
            debug!(chunk = i, total = chunks.len(), "speaking chunk");
            match self.synthesizer.speak(self.utterance(chunk, language)).await {
                Ok(()) => {}
                Err(SpeechError::Cancelled) => {
                    debug!(chunk = i, "utterance cancelled by the platform");
                    return false;
                }
                Err(e) => warn!(chunk = i, error = %e, "speech synthesis error, skipping chunk"),
            }
        }
        self.generation() == generation
    }

    /// Stop the current sequence and drop whatever the platform has queued.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.synthesizer.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_select_voice_spanish_preferred() {
        let voices = vec![
            Voice::new("Samantha", "en-US"),
            Voice::new("Paulina", "es-MX"),
            Voice::new("Google español", "es-ES"),
        ];
        let voice = select_voice(&voices, Language::Spanish).unwrap();
        assert_eq!(voice.name, "Google español");
    }

    #[test]
    fn test_select_voice_no_matching_locale() {
        let voices = vec![Voice::new("Google español", "es-ES")];
        assert_eq!(select_voice(&voices, Language::English), None);
        assert_eq!(select_voice(&[], Language::Spanish), None);
    }

    #[test]
    fn test_select_voice_allow_list_order_beats_list_order() {
        let voices = vec![
            Voice::new("Fred", "en-US"),
            Voice::new("Alex", "en-US"),
            Voice::new("Samantha (Enhanced)", "en-US"),
        ];
        let voice = select_voice(&voices, Language::English).unwrap();
        assert_eq!(voice.name, "Samantha (Enhanced)");
    }

    #[test]
    fn test_select_voice_falls_back_to_first_in_locale() {
        let voices = vec![Voice::new("Jorge", "es-ES"), Voice::new("Lucia", "es-ES")];
        let voice = select_voice(&voices, Language::Spanish).unwrap();
        assert_eq!(voice.name, "Jorge");
    }

    struct Recording {
        spoken: Mutex<Vec<String>>,
        fail_on: Option<usize>,
        cancel_on: Option<usize>,
    }

    #[async_trait]
    impl SpeechSynthesizer for Recording {
        fn voices(&self) -> Vec<Voice> {
            vec![Voice::new("Alex", "en-US")]
        }

        async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
            let mut spoken = self.spoken.lock().unwrap();
            let index = spoken.len();
            spoken.push(utterance.text);
            if self.fail_on == Some(index) {
                return Err(SpeechError::Platform("audio-busy".to_string()));
            }
            if self.cancel_on == Some(index) {
                return Err(SpeechError::Cancelled);
            }
            Ok(())
        }

        fn cancel_all(&self) {}
    }

    #[tokio::test]
    async fn test_speak_all_continues_after_error() {
        let output = VoiceOutput::new(Recording {
            spoken: Mutex::new(Vec::new()),
            fail_on: Some(0),
            cancel_on: None,
        });
        let chunks = vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()];
        assert!(output.speak_all(&chunks, Language::English, output.generation()).await);
        assert_eq!(*output.synthesizer().spoken.lock().unwrap(), chunks);
    }

    #[tokio::test]
    async fn test_speak_all_stops_when_platform_cancels() {
        let output = VoiceOutput::new(Recording {
            spoken: Mutex::new(Vec::new()),
            fail_on: None,
            cancel_on: Some(1),
        });
        let chunks = vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()];
        assert!(!output.speak_all(&chunks, Language::English, output.generation()).await);
        assert_eq!(*output.synthesizer().spoken.lock().unwrap(), vec!["One.", "Two."]);
    }

    #[tokio::test]
    async fn test_speak_all_with_old_generation_speaks_nothing() {
        let output = VoiceOutput::new(Recording {
            spoken: Mutex::new(Vec::new()),
            fail_on: None,
            cancel_on: None,
        });
        let generation = output.generation();
        output.cancel();
        assert_ne!(output.generation(), generation);

        let chunks = vec!["One.".to_string()];
        assert!(!output.speak_all(&chunks, Language::English, generation).await);
        assert!(output.synthesizer().spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn test_utterance_parameters() {
        let output = VoiceOutput::new(Recording {
            spoken: Mutex::new(Vec::new()),
            fail_on: None,
            cancel_on: None,
        });
        let english = output.utterance("Hi.", Language::English);
        assert_eq!(english.voice, Some(Voice::new("Alex", "en-US")));
        assert_eq!(english.rate, 1.1);
        assert_eq!(english.pitch, 1.1);
        assert_eq!(english.volume, 1.0);

        let spanish = output.utterance("Hola.", Language::Spanish);
        assert_eq!(spanish.voice, None);
        assert_eq!(spanish.pitch, 1.2);
    }
}
