pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Ollama,
    OpenAI,
    Anthropic,
    Gemini,
    DeepSeek,
    XAI,
    Groq,
}

impl LlmType {
    /// Backends that refuse to start without an API credential.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmType::Ollama)
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmType::Ollama => "ollama",
            LlmType::OpenAI => "openai",
            LlmType::Anthropic => "anthropic",
            LlmType::Gemini => "gemini",
            LlmType::DeepSeek => "deepseek",
            LlmType::XAI => "xai",
            LlmType::Groq => "groq",
        };
        write!(f, "{}", name)
    }
}

/// Failures that stop the service before it can answer anything.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid LLM type: '{0}'")]
    InvalidLlmType(String),
    #[error("API key is required for the {0} chat backend")]
    MissingApiKey(LlmType),
    #[error("Failed to build {backend} chat client: {message}")]
    ClientBuild {
        backend: LlmType,
        message: String,
    },
}

impl FromStr for LlmType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "openai" => Ok(LlmType::OpenAI),
            "anthropic" => Ok(LlmType::Anthropic),
            "gemini" | "google" => Ok(LlmType::Gemini),
            "deepseek" => Ok(LlmType::DeepSeek),
            "xai" => Ok(LlmType::XAI),
            "groq" => Ok(LlmType::Groq),
            _ => Err(ConfigError::InvalidLlmType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Gemini,
            api_key: None,
            completion_model: None,
            base_url: None,
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    /// Returns the API key, treating an empty or blank value as absent.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingApiKey(self.llm_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_llm_types_case_insensitively() {
        assert_eq!("Gemini".parse::<LlmType>().unwrap(), LlmType::Gemini);
        assert_eq!("google".parse::<LlmType>().unwrap(), LlmType::Gemini);
        assert_eq!(" OPENAI ".parse::<LlmType>().unwrap(), LlmType::OpenAI);
        assert!(matches!("bard".parse::<LlmType>(), Err(ConfigError::InvalidLlmType(_))));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = LlmConfig { api_key: Some("   ".into()), ..Default::default() };
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey(LlmType::Gemini))));

        let config = LlmConfig { api_key: Some("k-123".into()), ..Default::default() };
        assert_eq!(config.require_api_key().unwrap(), "k-123");
    }
}
