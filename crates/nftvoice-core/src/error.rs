use reqwest::StatusCode;

/// Failures talking to the chat or NFT metadata endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

/// Failures reported by a recognition or synthesis platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech capability unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Platform(String),

    #[error("Speech was cancelled")]
    Cancelled,
}
