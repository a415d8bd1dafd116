mod memory;
mod redis;
use async_trait::async_trait;
use log::info;
use std::error::Error;
use crate::cli::Args;
use std::sync::Arc;
use crate::models::chat::{ Conversation, Turn };

pub use self::memory::MemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_turn(
        &self,
        conversation_id: &str,
        turn: &Turn
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// The most recent `limit` turns, oldest first.
    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "redis" => {
            let store = RedisHistoryStore::new(
                &args.history_host,
                &args.history_redis_prefix,
                args.history_retention
            )?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryHistoryStore::with_retention(args.history_retention))),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.history_type.eq_ignore_ascii_case("memory") {
        info!("Chat history will be kept in process memory");
    } else {
        info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    }
    create_history_store(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn selects_store_by_type() {
        let args = Args::try_parse_from(["support-agent", "--history-type", "memory"]).unwrap();
        assert!(create_history_store(&args).is_ok());

        let args = Args::try_parse_from(["support-agent", "--history-type", "sqlite"]).unwrap();
        assert!(create_history_store(&args).is_err());
    }
}
