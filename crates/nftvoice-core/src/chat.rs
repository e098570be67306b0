use crate::error::ApiError;
use crate::language::Language;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    #[serde(rename = "userInput")]
    pub user_input: String,
    pub language: Language,
    pub nft_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// Anything that can turn a transcript into reply text
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    async fn send(&self, request: &ChatRequest) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.response)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.query(request).await
    }
}

/// Ask the backend for a reply, falling back to the localized apology on
/// any failure. Never retries.
pub async fn reply_or_apology<B: ChatBackend + ?Sized>(backend: &B, request: &ChatRequest) -> String {
    match backend.send(request).await {
        Ok(reply) => {
            debug!(chars = reply.chars().count(), "chat reply received");
            reply
        }
        Err(e) => {
            error!(error = %e, "chat request failed");
            request.language.apology().to_string()
        }
    }
}
