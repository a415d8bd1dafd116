pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod reply;

use cli::Args;
use config::prompt::load_prompts_or_default;
use config::reply::{ chat_llm_config, ReplyConfig };
use history::initialize_history_store;
use llm::chat::new_client as new_chat_client;
use log::info;
use reply::ReplyGenerator;
use server::api::AppState;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("History Store Type: {}", args.history_type);
    info!("History Store Host: {}", args.history_host);
    info!("History Limit: {}", args.history_limit);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Input Token Budget: {}", args.input_token_budget);
    info!("Output Token Budget: {}", args.output_token_budget);
    info!("Temperature: {}", args.temperature);
    info!("Max Attempts: {}", args.max_attempts);
    info!("Base Backoff: {}ms", args.base_backoff_ms);
    info!("Attempt Timeout: {}ms", args.attempt_timeout_ms);
    info!("Rate Limit: {}/s", args.rate_limit_per_second);
    info!("-------------------------");

    let reply_config = ReplyConfig::from_args(&args);
    let llm_config = chat_llm_config(&args, &reply_config)?;
    let chat_client = new_chat_client(&llm_config)?;
    let prompts = load_prompts_or_default(args.prompts_path.as_deref())?;
    let generator = Arc::new(ReplyGenerator::new(chat_client, prompts, reply_config));
    let history_store = initialize_history_store(&args)?;

    let state = AppState::new(
        generator,
        history_store,
        args.server_api_key.clone(),
        args.history_limit,
        args.rate_limit_per_second
    );
    let api_key_configured = args.server_api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
    let server = Server::new(args.server_addr.clone(), state, api_key_configured);
    server.run().await?;

    Ok(())
}
