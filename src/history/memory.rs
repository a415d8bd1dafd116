use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::RwLock;

use crate::history::HistoryStore;
use crate::models::chat::{ Conversation, StoredTurn, Turn };

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Vec<StoredTurn>>>,
    retention: usize,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `retention` turns per conversation; 0 keeps everything.
    pub fn with_retention(retention: usize) -> Self {
        Self { retention, ..Self::default() }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_turn(
        &self,
        conversation_id: &str,
        turn: &Turn
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let stored = StoredTurn {
            sender: turn.sender,
            text: turn.text.clone(),
            timestamp: Utc::now().timestamp(),
        };
        let mut guard = self.conversations.write().await;
        let turns = guard.entry(conversation_id.to_string()).or_default();
        turns.push(stored);
        if self.retention > 0 && turns.len() > self.retention {
            let excess = turns.len() - self.retention;
            turns.drain(..excess);
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let guard = self.conversations.read().await;
        let turns = guard
            .get(conversation_id)
            .map(|all| all[all.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default();

        Ok(Conversation {
            id: conversation_id.to_string(),
            turns,
        })
    }
}
