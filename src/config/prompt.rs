use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use log::info;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Prompt field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Static instructions placed at the head of every prompt.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    pub system_instruction: String,
    #[serde(default)]
    pub faq: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_instruction: String::from(
                "You are a friendly and professional customer support agent for an online store. \
                 Answer clearly and concisely, stay polite, and only use the facts below. \
                 If you do not know the answer, say so and offer to connect the customer with a human agent."
            ),
            faq: vec![
                "Returns are accepted within 30 days of delivery for unused items in original packaging.".into(),
                "Standard shipping takes 5-7 business days; express shipping takes 1-2 business days.".into(),
                "Orders over $50 ship for free within the continental US.".into(),
                "Refunds are issued to the original payment method within 5 business days of receiving the return.".into(),
                "Support is available Monday to Friday, 9am to 6pm Eastern Time.".into()
            ],
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_instruction.trim().is_empty() {
            return Err(PromptError::EmptyField("system_instruction"));
        }
        Ok(())
    }

    /// Renders the system block: instruction followed by the FAQ list.
    pub fn system_block(&self) -> String {
        let mut block = self.system_instruction.trim().to_string();
        let facts: Vec<&str> = self.faq
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        if !facts.is_empty() {
            block.push_str("\n\nFrequently asked questions:\n");
            let lines = facts
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n");
            block.push_str(&lines);
        }
        block
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompt configuration from: {}", path.as_ref().display());
    Ok(Arc::new(config))
}

/// Loads the prompt file when one is configured, otherwise the built-in defaults.
pub fn load_prompts_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => load_prompts(p),
        None => {
            info!("No prompts file configured, using built-in support prompt");
            Ok(Arc::new(PromptConfig::default()))
        }
    }
}
