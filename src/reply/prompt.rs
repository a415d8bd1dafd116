use crate::config::prompt::PromptConfig;
use crate::models::chat::Turn;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Rough token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// One `Role: text` line per turn, oldest first.
pub fn serialize_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.sender.role_label(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps only the trailing `budget * 4` characters when the estimate is over
/// budget. The cut lands on a character boundary and may split a line.
pub fn truncate_history(serialized: &str, budget_tokens: usize) -> &str {
    if estimate_tokens(serialized) <= budget_tokens {
        return serialized;
    }
    let keep = budget_tokens.saturating_mul(CHARS_PER_TOKEN);
    let total = serialized.chars().count();
    match serialized.char_indices().nth(total - keep) {
        Some((start, _)) => &serialized[start..],
        None => "",
    }
}

pub struct PromptAssembler<'a> {
    prompts: &'a PromptConfig,
    input_token_budget: usize,
}

impl<'a> PromptAssembler<'a> {
    pub fn new(prompts: &'a PromptConfig, input_token_budget: usize) -> Self {
        Self { prompts, input_token_budget }
    }

    /// System block, history, user message, assistant cue; always in that order.
    pub fn assemble(&self, history: &[Turn], user_message: &str) -> String {
        let serialized = serialize_history(history);
        let kept = truncate_history(&serialized, self.input_token_budget);

        let mut prompt = self.prompts.system_block();
        prompt.push_str("\n\n");
        if !kept.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(kept);
            prompt.push_str("\n\n");
        }
        prompt.push_str("User: ");
        prompt.push_str(user_message);
        prompt.push_str("\nAssistant:");
        prompt
    }
}
