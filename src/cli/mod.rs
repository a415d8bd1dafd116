use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// History chat store type (redis, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "redis")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "history:")]
    pub history_redis_prefix: String,

    /// Number of most recent turns loaded as context for each reply.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "20")]
    pub history_limit: usize,

    /// Turns kept per conversation; older ones are trimmed on write. 0 keeps everything.
    #[arg(long, env = "HISTORY_RETENTION", default_value = "200")]
    pub history_retention: usize,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (gemini, openai, anthropic, deepseek, groq, xai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider. Required by every provider except Ollama.
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-1.5-flash, gpt-4o-mini, llama3.2)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    // --- Reply Generation Args ---
    /// Budget, in estimated tokens (4 characters each), for the serialized history.
    #[arg(long, env = "REPLY_INPUT_TOKEN_BUDGET", default_value = "4000")]
    pub input_token_budget: usize,

    /// Maximum number of tokens the provider may generate per reply.
    #[arg(long, env = "REPLY_OUTPUT_TOKEN_BUDGET", default_value = "500")]
    pub output_token_budget: u32,

    /// Sampling temperature passed to the provider.
    #[arg(long, env = "REPLY_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Maximum provider calls per reply, including the first one.
    #[arg(long, env = "REPLY_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Base delay in milliseconds; doubles after every failed attempt.
    #[arg(long, env = "REPLY_BASE_BACKOFF_MS", default_value = "1000")]
    pub base_backoff_ms: u64,

    /// Wall-clock limit in milliseconds for a single provider call.
    #[arg(long, env = "REPLY_ATTEMPT_TIMEOUT_MS", default_value = "30000")]
    pub attempt_timeout_ms: u64,

    /// Optional path to a JSON file with `system_instruction` and `faq` entries.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key required in the `x-api-key` header. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Maximum chat requests accepted per second across all clients.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,
}
