pub mod ollama;
pub mod openai;
pub mod hosted;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use thiserror::Error;
use log::info;
use super::{ ConfigError, LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use self::hosted::HostedChatClient;

// Gemini authenticates with `?key=` and reqwest echoes the full URL in its errors.
lazy_static! {
    static ref SECRET_PARAM: Regex = Regex::new(
        r"(?i)\b(key|api_key|apikey|access_token|token)=[^&\s)]+"
    ).expect("secret pattern compiles");
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// A failed backend call. Variants carry the structured signal when the
/// backend exposes one; `Other` holds only a message.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("backend returned HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
    },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) =>
                ChatError::Status {
                    status: status.as_u16(),
                    message: redact_secrets(&err.to_string()),
                },
            None if err.is_decode() => ChatError::Decode(redact_secrets(&err.to_string())),
            None => ChatError::Transport(redact_secrets(&err.to_string())),
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ChatError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

/// Builds the chat backend selected by `config`. Called once at startup;
/// the returned handle is shared by every request.
pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ConfigError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Gemini | LlmType::Anthropic | LlmType::DeepSeek | LlmType::Groq | LlmType::XAI => {
            let specific_client = HostedChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    info!(
        "Chat client configured: Type={}, Model={}, BaseURL={:?}",
        config.llm_type,
        client.get_model(),
        client.get_base_url()
    );
    Ok(client)
}

/// Masks credential query parameters so error text is safe to log.
pub fn redact_secrets(message: &str) -> String {
    SECRET_PARAM.replace_all(message, "$1=[REDACTED]").into_owned()
}

/// Collapses a provider error body into a single line for logging.
pub(crate) fn summarize_body(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 300 {
        let cut: String = flat.chars().take(300).collect();
        format!("{}…", cut)
    } else {
        flat
    }
}
