use async_trait::async_trait;
use crate::models::chat::{ Conversation, StoredTurn, Turn };
use crate::history::HistoryStore;
use std::error::Error;
use chrono::Utc;
use log::error;
use redis::{ Client, AsyncCommands };

/// One Redis list per conversation, newest turn at the head. Lists are
/// trimmed to `retention` entries on every write (0 disables trimming).
pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
    retention: usize,
}

impl RedisHistoryStore {
    pub fn new(
        host: &str,
        key_prefix: &str,
        retention: usize
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
            retention,
        })
    }

    fn key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

/// Last index LTRIM keeps, or `None` when retention is unbounded.
fn trim_stop(retention: usize) -> Option<isize> {
    if retention == 0 {
        None
    } else {
        Some(isize::try_from(retention - 1).unwrap_or(isize::MAX))
    }
}

/// Decodes entries read newest first into oldest-first turns, skipping
/// anything that no longer parses.
fn decode_entries(json_entries: &[String]) -> Vec<StoredTurn> {
    let mut turns = Vec::with_capacity(json_entries.len());
    for json_entry in json_entries {
        match serde_json::from_str::<StoredTurn>(json_entry) {
            Ok(turn) => turns.push(turn),
            Err(e) => {
                error!("Error parsing history entry: {}", e);
            }
        }
    }
    turns.reverse();
    turns
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn add_turn(
        &self,
        conversation_id: &str,
        turn: &Turn
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let stored = StoredTurn {
            sender: turn.sender,
            text: turn.text.clone(),
            timestamp: Utc::now().timestamp(),
        };

        let key = self.key(conversation_id);
        let json_msg = serde_json::to_string(&stored)?;
        match trim_stop(self.retention) {
            Some(stop) => {
                let _: () = redis::pipe()
                    .atomic()
                    .lpush(&key, &json_msg)
                    .ignore()
                    .ltrim(&key, 0, stop)
                    .ignore()
                    .query_async(&mut conn).await?;
            }
            None => {
                let _: i64 = conn.lpush(&key, &json_msg).await?;
            }
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        if limit == 0 {
            return Ok(Conversation { id: conversation_id.to_string(), turns: Vec::new() });
        }
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(
            self.key(conversation_id),
            0,
            (limit as isize) - 1
        ).await?;

        Ok(Conversation {
            id: conversation_id.to_string(),
            turns: decode_entries(&json_entries),
        })
    }
}
