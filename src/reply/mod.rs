pub mod classify;
pub mod prompt;
pub mod retry;

use log::{ error, info, warn };
use std::sync::Arc;

use crate::config::prompt::PromptConfig;
use crate::config::reply::ReplyConfig;
use crate::llm::chat::{ ChatClient, CompletionRequest };
use crate::models::chat::Turn;
use self::classify::{ AttemptError, FailureKind };
use self::prompt::PromptAssembler;
use self::retry::RetryPolicy;

pub const MAX_REPLY_CHARS: usize = 2000;

/// Returned whenever no usable reply could be generated.
pub const FALLBACK_REPLY: &str =
    "Sorry, our support assistant is temporarily unavailable. Please try again in a moment.";

/// Turns a conversation into one bounded, retried backend call.
///
/// Holds no per-call state; one instance is built at startup and shared by
/// every request. Construct it with the shared client returned by
/// [`crate::llm::chat::new_client`].
pub struct ReplyGenerator {
    chat_client: Arc<dyn ChatClient>,
    prompts: Arc<PromptConfig>,
    config: ReplyConfig,
    policy: RetryPolicy,
}

impl ReplyGenerator {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompts: Arc<PromptConfig>,
        config: ReplyConfig
    ) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self { chat_client, prompts, config, policy }
    }

    pub fn build_prompt(&self, history: &[Turn], user_message: &str) -> String {
        PromptAssembler::new(&self.prompts, self.config.input_token_budget).assemble(
            history,
            user_message
        )
    }

    /// Generates the reply to `user_message`. Never fails: every error path
    /// ends in [`FALLBACK_REPLY`]. The result is non-empty and at most
    /// [`MAX_REPLY_CHARS`] characters.
    pub async fn generate_reply(&self, history: &[Turn], user_message: &str) -> String {
        let request = CompletionRequest {
            prompt: self.build_prompt(history, user_message),
            max_tokens: self.config.output_token_budget,
            temperature: self.config.temperature,
        };

        for attempt in 0..self.policy.max_attempts {
            match self.attempt(&request).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        warn!(
                            "Empty completion on attempt {}/{}; returning fallback",
                            attempt + 1,
                            self.policy.max_attempts
                        );
                        return FALLBACK_REPLY.to_string();
                    }
                    if attempt > 0 {
                        info!("Reply generated on attempt {}/{}", attempt + 1, self.policy.max_attempts);
                    }
                    return cap_reply(text);
                }
                Err(err) => {
                    if err.kind() == FailureKind::NonRetryable {
                        error!(
                            "Non-retryable error on attempt {}/{}: {}",
                            attempt + 1,
                            self.policy.max_attempts,
                            err
                        );
                        return FALLBACK_REPLY.to_string();
                    }
                    if !self.policy.has_attempt_after(attempt) {
                        error!(
                            "Giving up after {} attempts, last error: {}",
                            self.policy.max_attempts,
                            err
                        );
                        break;
                    }
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "Retry attempt {}/{} in {:?} after error: {}",
                        attempt + 2,
                        self.policy.max_attempts,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        FALLBACK_REPLY.to_string()
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, AttemptError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.chat_client.complete(request)).await {
            Ok(Ok(resp)) => Ok(resp.response),
            Ok(Err(e)) => Err(AttemptError::Backend(e)),
            Err(_) => Err(AttemptError::Timeout),
        }
    }
}

/// Truncates to [`MAX_REPLY_CHARS`] characters.
pub fn cap_reply(text: &str) -> String {
    match text.char_indices().nth(MAX_REPLY_CHARS) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::mock::{ ScriptedClient, Step };
    use crate::llm::chat::ChatError;
    use std::time::Duration;

    fn generator(client: Arc<ScriptedClient>) -> ReplyGenerator {
        ReplyGenerator::new(client, Arc::new(PromptConfig::default()), ReplyConfig::default())
    }

    fn unavailable() -> ChatError {
        ChatError::Status { status: 503, message: "overloaded".into() }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_is_returned_verbatim() {
        let client = Arc::new(ScriptedClient::replying("30-day returns."));
        let reply = generator(client.clone()).generate_reply(
            &[Turn::user("Hi")],
            "What's your return policy?"
        ).await;

        assert_eq!(reply, "30-day returns.");
        assert_eq!(client.call_count(), 1);
        assert!(client.gaps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_is_trimmed_and_capped() {
        let long = format!("  {}  ", "a".repeat(2500));
        let client = Arc::new(ScriptedClient::replying(&long));
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply.chars().count(), MAX_REPLY_CHARS);
        assert!(reply.starts_with('a'));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_after_one_attempt() {
        let client = Arc::new(
            ScriptedClient::new(
                vec![
                    Step::Fail(ChatError::Status { status: 401, message: "bad key".into() }),
                    Step::Reply("never reached".into())
                ]
            )
        );
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn api_key_message_is_not_retried() {
        let client = Arc::new(
            ScriptedClient::new(
                vec![
                    Step::Fail(ChatError::Other("API_KEY_INVALID".into())),
                    Step::Reply("never reached".into())
                ]
            )
        );
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hosted_auth_rejection_is_not_retried() {
        let rejected = rllm::error::LLMError::HttpError(
            "HTTP status client error (401 Unauthorized) for url (https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=SECRET-KEY-123)".into()
        );
        let client = Arc::new(
            ScriptedClient::new(
                vec![Step::Fail(ChatError::from(rejected)), Step::Reply("never reached".into())]
            )
        );
        let started = tokio::time::Instant::now();
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn attempt_errors_never_show_the_api_key() {
        let rejected = rllm::error::LLMError::HttpError(
            "HTTP status client error (403 Forbidden) for url (https://host/v1/m?alt=json&key=SECRET-KEY-123)".into()
        );
        let err = AttemptError::Backend(ChatError::from(rejected));
        assert_eq!(err.kind(), FailureKind::NonRetryable);
        assert!(!err.to_string().contains("SECRET-KEY-123"));
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_errors_exhaust_all_attempts_with_backoff() {
        let client = Arc::new(
            ScriptedClient::new(
                vec![
                    Step::Fail(unavailable()),
                    Step::Fail(ChatError::Transport("connection reset".into())),
                    Step::Fail(unavailable()),
                    Step::Reply("never reached".into())
                ]
            )
        );
        let started = tokio::time::Instant::now();
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.gaps(), vec![Duration::from_millis(1000), Duration::from_millis(2000)]);
        // No sleep after the final attempt.
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_success_is_not_retried() {
        let client = Arc::new(
            ScriptedClient::new(vec![Step::Reply("   \n ".into()), Step::Reply("late".into())])
        );
        let reply = generator(client.clone()).generate_reply(&[], "hello").await;

        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried_until_success() {
        let stall = Duration::from_secs(60);
        let client = Arc::new(
            ScriptedClient::new(
                vec![
                    Step::Stall(stall, "too late".into()),
                    Step::Stall(stall, "too late".into()),
                    Step::Reply("Shipped in 5-7 days.".into())
                ]
            )
        );
        let reply = generator(client.clone()).generate_reply(&[], "Where is my order?").await;

        assert_eq!(reply, "Shipped in 5-7 days.");
        assert_eq!(client.call_count(), 3);
        // 30s timeout + backoff before each retry.
        assert_eq!(client.gaps(), vec![Duration::from_millis(31_000), Duration::from_millis(32_000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_config_never_sleeps() {
        let client = Arc::new(ScriptedClient::new(vec![Step::Fail(unavailable())]));
        let config = ReplyConfig { max_attempts: 1, ..ReplyConfig::default() };
        let generator = ReplyGenerator::new(client.clone(), Arc::new(PromptConfig::default()), config);
        let started = tokio::time::Instant::now();

        assert_eq!(generator.generate_reply(&[], "hi").await, FALLBACK_REPLY);
        assert_eq!(client.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_receives_budget_and_truncated_prompt() {
        let client = Arc::new(ScriptedClient::replying("ok"));
        let config = ReplyConfig { input_token_budget: 5, ..ReplyConfig::default() };
        let generator = ReplyGenerator::new(
            client.clone(),
            Arc::new(PromptConfig { system_instruction: "Support.".into(), faq: vec![] }),
            config
        );
        let history = vec![Turn::user("old question"), Turn::ai("old answer")];
        generator.generate_reply(&history, "new question").await;

        let requests = client.requests();
        assert_eq!(requests[0].max_tokens, 500);
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(
            requests[0].prompt,
            "Support.\n\nConversation so far:\nssistant: old answer\n\nUser: new question\nAssistant:"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn identical_input_yields_identical_prompt_and_reply() {
        let client = Arc::new(
            ScriptedClient::new(vec![Step::Reply("same".into()), Step::Reply("same".into())])
        );
        let generator = generator(client.clone());
        let history = vec![Turn::user("Hi"), Turn::ai("Hello")];

        let first = generator.generate_reply(&history, "Refund?").await;
        let second = generator.generate_reply(&history, "Refund?").await;

        assert_eq!(first, second);
        let prompts = client.prompts();
        assert_eq!(prompts[0], prompts[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_do_not_interfere() {
        let client = Arc::new(
            ScriptedClient::new(vec![Step::Reply("one".into()), Step::Reply("two".into())])
        );
        let generator = generator(client.clone());

        let (a, b) = tokio::join!(
            generator.generate_reply(&[], "first"),
            generator.generate_reply(&[], "second")
        );

        let mut replies = vec![a, b];
        replies.sort();
        assert_eq!(replies, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        let text = "é".repeat(2100);
        let capped = cap_reply(&text);
        assert_eq!(capped.chars().count(), MAX_REPLY_CHARS);
        assert_eq!(cap_reply("short"), "short");
    }

    #[test]
    fn fallback_fits_the_reply_contract() {
        assert!(!FALLBACK_REPLY.trim().is_empty());
        assert!(FALLBACK_REPLY.chars().count() <= MAX_REPLY_CHARS);
    }
}
