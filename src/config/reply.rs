use std::time::Duration;

use crate::cli::Args;
use crate::llm::{ ConfigError, LlmConfig, LlmType };

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Tuning for reply generation. Defaults mirror the CLI defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyConfig {
    /// Budget for the serialized history, in estimated tokens.
    pub input_token_budget: usize,
    pub output_token_budget: u32,
    pub temperature: f32,
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub attempt_timeout: Duration,
    pub model: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            input_token_budget: 4000,
            output_token_budget: 500,
            temperature: 0.7,
            max_attempts: 3,
            base_backoff: Duration::from_millis(1000),
            attempt_timeout: Duration::from_millis(30_000),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ReplyConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            input_token_budget: args.input_token_budget,
            output_token_budget: args.output_token_budget,
            temperature: args.temperature,
            max_attempts: args.max_attempts,
            base_backoff: Duration::from_millis(args.base_backoff_ms),
            attempt_timeout: Duration::from_millis(args.attempt_timeout_ms),
            model: args.chat_model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

/// Chat backend settings. The model falls back to the adapter default unless
/// one was given explicitly or the backend is Gemini.
pub fn chat_llm_config(args: &Args, reply: &ReplyConfig) -> Result<LlmConfig, ConfigError> {
    let llm_type: LlmType = args.chat_llm_type.parse()?;
    let completion_model = match &args.chat_model {
        Some(m) if !m.trim().is_empty() => Some(m.clone()),
        _ if llm_type == LlmType::Gemini => Some(reply.model.clone()),
        _ => None,
    };
    let api_key = if !args.chat_api_key.is_empty() {
        Some(args.chat_api_key.clone())
    } else {
        None
    };

    Ok(LlmConfig {
        llm_type,
        api_key,
        completion_model,
        base_url: args.chat_base_url.clone(),
        max_tokens: reply.output_token_budget,
        temperature: reply.temperature,
    })
}
