use serde::{ Serialize, Deserialize };

use super::chat::StoredTurn;

#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub reply: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub turns: Vec<StoredTurn>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
