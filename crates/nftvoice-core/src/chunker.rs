//! Splits reply text into sentence-aligned chunks short enough for a
//! synthesizer to speak without truncating or stalling.

use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_MAX_CHUNK_LEN: usize = 100;

fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A sentence runs up to a run of terminators; trailing unterminated text
    // is a sentence of its own.
    PATTERN.get_or_init(|| Regex::new(r"[^.!?]*[.!?]+|[^.!?]+$").expect("valid sentence regex"))
}

/// Segment `text` into sentences, keeping surrounding whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let sentences: Vec<&str> = sentence_pattern().find_iter(text).map(|m| m.as_str()).collect();
    if sentences.is_empty() && !text.is_empty() {
        return vec![text];
    }
    sentences
}

/// Greedily pack sentences into chunks of at most `max_len` characters.
///
/// A sentence longer than `max_len` is emitted as its own chunk, unsplit.
/// Chunks are trimmed and never empty.
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > max_len {
            push_trimmed(&mut chunks, &current);
            current.clear();
            current.push_str(sentence);
            current_len = sentence_len;
        } else {
            current.push_str(sentence);
            current_len += sentence_len;
        }
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
