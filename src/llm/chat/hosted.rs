use async_trait::async_trait;
use log::debug;

use super::{redact_secrets, ChatClient, ChatError, CompletionRequest, CompletionResponse};
use crate::llm::{ConfigError, LlmConfig, LlmType};
use rllm::chat::{ChatMessage, ChatRole, MessageType};
use rllm::builder::{LLMBackend, LLMBuilder};
use rllm::error::LLMError;
use rllm::LLMProvider;
use lazy_static::lazy_static;
use regex::Regex;

// reqwest's `error_for_status` text: "HTTP status client error (401 Unauthorized) for url (...)".
lazy_static! {
    static ref HTTP_STATUS: Regex = Regex::new(r"HTTP status [a-z ]*error \((\d{3})").expect(
        "status pattern compiles"
    );
}

/// Chat backend for hosted providers reached through rllm.
///
/// rllm fixes `max_tokens` and `temperature` when the provider is built, so
/// they are taken from [`LlmConfig`] here rather than per request. The
/// service builds both from the same reply settings.
pub struct HostedChatClient {
    llm: Box<dyn LLMProvider>,
    backend: LlmType,
    max_tokens: u32,
    temperature: f32,
    model: String,
    base_url: Option<String>,
}

fn rllm_backend(llm_type: LlmType) -> Option<LLMBackend> {
    match llm_type {
        LlmType::Gemini => Some(LLMBackend::Google),
        LlmType::Anthropic => Some(LLMBackend::Anthropic),
        LlmType::DeepSeek => Some(LLMBackend::DeepSeek),
        LlmType::Groq => Some(LLMBackend::Groq),
        LlmType::XAI => Some(LLMBackend::XAI),
        LlmType::Ollama | LlmType::OpenAI => None,
    }
}

fn default_model(llm_type: LlmType) -> &'static str {
    match llm_type {
        LlmType::Gemini => "gemini-1.5-flash",
        LlmType::Anthropic => "claude-3-5-haiku-latest",
        LlmType::DeepSeek => "deepseek-chat",
        LlmType::Groq => "llama-3.1-8b-instant",
        LlmType::XAI => "grok-2-latest",
        LlmType::Ollama | LlmType::OpenAI => "",
    }
}

impl HostedChatClient {
    pub fn new(
        backend: LlmType,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        max_tokens: u32,
        temperature: f32
    ) -> Result<Self, ConfigError> {
        let rllm_backend = rllm_backend(backend).ok_or_else(|| ConfigError::ClientBuild {
            backend,
            message: "backend is not served through rllm".into(),
        })?;
        let chat_model = model.unwrap_or_else(|| default_model(backend).to_string());

        let mut builder = LLMBuilder::new()
            .backend(rllm_backend)
            .api_key(api_key)
            .model(&chat_model)
            .max_tokens(max_tokens)
            .temperature(temperature)
            .stream(false);

        if let Some(url) = &base_url {
            builder = builder.base_url(url);
        }

        let llm = builder.build().map_err(|e| ConfigError::ClientBuild {
            backend,
            message: e.to_string(),
        })?;

        Ok(Self {
            llm,
            backend,
            max_tokens,
            temperature,
            model: chat_model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Self::new(
            config.llm_type,
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            config.temperature
        )
    }
}

/// Status code embedded in an rllm `HttpError` message, if any.
fn status_from_message(message: &str) -> Option<u16> {
    HTTP_STATUS.captures(message)?.get(1)?.as_str().parse().ok()
}

/// True when a request asks for settings the provider was not built with.
fn differs_from_built(max_tokens: u32, temperature: f32, request: &CompletionRequest) -> bool {
    request.max_tokens != max_tokens || (request.temperature - temperature).abs() > f32::EPSILON
}

impl From<LLMError> for ChatError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::AuthError(msg) => ChatError::Auth(redact_secrets(&msg)),
            LLMError::InvalidRequest(msg) => ChatError::InvalidRequest(redact_secrets(&msg)),
            LLMError::HttpError(msg) => {
                let message = redact_secrets(&msg);
                match status_from_message(&msg) {
                    Some(status) => ChatError::Status { status, message },
                    None => ChatError::Other(message),
                }
            }
            LLMError::JsonError(msg) => ChatError::Decode(redact_secrets(&msg)),
            other => ChatError::Other(redact_secrets(&other.to_string())),
        }
    }
}

#[async_trait]
impl ChatClient for HostedChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ChatError> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: request.prompt.clone(),
            message_type: MessageType::Text,
        }];
        debug!(
            "HostedChatClient::complete() → backend={} model={} base_url={:?}",
            self.backend,
            self.model,
            self.base_url
        );
        if differs_from_built(self.max_tokens, self.temperature, request) {
            debug!(
                "HostedChatClient ignores per-request max_tokens={} temperature={}; built with {} / {}",
                request.max_tokens,
                request.temperature,
                self.max_tokens,
                self.temperature
            );
        }
        let resp = self.llm.chat(&messages).await?;
        let text = resp.text().unwrap_or_default();
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}
