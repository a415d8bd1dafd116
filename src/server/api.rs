use crate::history::HistoryStore;
use crate::models::api::{ ChatRequest, ChatResponse, ConversationResponse, ErrorResponse };
use crate::models::chat::Turn;
use crate::reply::{ ReplyGenerator, MAX_REPLY_CHARS };
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ Path, State },
    response::{ IntoResponse, Response },
    http::{ HeaderMap, StatusCode },
};
use chrono::Utc;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;
use log::{ info, warn, error };

pub const API_KEY_HEADER: &str = "x-api-key";

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    generator: Arc<ReplyGenerator>,
    history: Arc<dyn HistoryStore>,
    limiter: Arc<Limiter>,
    api_key: Option<String>,
    history_limit: usize,
}

impl AppState {
    pub fn new(
        generator: Arc<ReplyGenerator>,
        history: Arc<dyn HistoryStore>,
        api_key: Option<String>,
        history_limit: usize,
        rate_limit_per_second: u32
    ) -> Self {
        let per_second = NonZeroU32::new(rate_limit_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            generator,
            history,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            history_limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/conversations/{id}", get(conversation_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (code, Json(ErrorResponse { error: message.to_string() })).into_response()
}

fn check_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.api_key else {
        return Ok(());
    };
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("Rejected request with missing or invalid API key");
        Err(error_response(StatusCode::UNAUTHORIZED, "Invalid or missing API key"))
    }
}

/// Trims the message and enforces the length limits.
pub fn validate_message(message: &str) -> Result<&str, &'static str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err("Message must not be empty");
    }
    if trimmed.chars().count() > MAX_REPLY_CHARS {
        return Err("Message is too long");
    }
    Ok(trimmed)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>
) -> Response {
    if let Err(resp) = check_api_key(&state, &headers) {
        return resp;
    }
    if state.limiter.check().is_err() {
        warn!("Rate limit exceeded, rejecting chat request");
        return error_response(StatusCode::TOO_MANY_REQUESTS, "Too many requests, slow down");
    }
    let message = match validate_message(&req.message) {
        Ok(m) => m,
        Err(reason) => {
            return error_response(StatusCode::BAD_REQUEST, reason);
        }
    };
    let conversation_id = req.conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let history = match state.history.get_conversation(&conversation_id, state.history_limit).await {
        Ok(conversation) => conversation.history(),
        Err(e) => {
            error!("History read failed for {}: {}", conversation_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not load conversation");
        }
    };

    if let Err(e) = state.history.add_turn(&conversation_id, &Turn::user(message)).await {
        error!("History write (user) failed for {}: {}", conversation_id, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not save message");
    }

    let reply = state.generator.generate_reply(&history, message).await;

    if let Err(e) = state.history.add_turn(&conversation_id, &Turn::ai(reply.as_str())).await {
        error!("History write (ai) failed for {}: {}", conversation_id, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not save reply");
    }
    info!("Replied in conversation {} ({} turns of context)", conversation_id, history.len());

    Json(ChatResponse {
        conversation_id,
        reply,
        timestamp: Utc::now().timestamp(),
    }).into_response()
}

async fn conversation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>
) -> Response {
    if let Err(resp) = check_api_key(&state, &headers) {
        return resp;
    }
    match state.history.get_conversation(&id, state.history_limit).await {
        Ok(conversation) =>
            Json(ConversationResponse {
                conversation_id: conversation.id,
                turns: conversation.turns,
            }).into_response(),
        Err(e) => {
            error!("History read failed for {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not load conversation")
        }
    }
}
