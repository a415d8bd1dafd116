use std::fmt;

use crate::llm::chat::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Retryable,
    NonRetryable,
}

/// Why a single attempt did not produce text.
#[derive(Debug)]
pub enum AttemptError {
    Timeout,
    Backend(ChatError),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Timeout => write!(f, "attempt timed out"),
            AttemptError::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl AttemptError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Timeout => FailureKind::Retryable,
            AttemptError::Backend(e) => classify(e),
        }
    }
}

// Matched case-sensitively against messages that carry no structured code.
const NON_RETRYABLE_SIGNATURES: &[&str] = &[
    "401",
    "403",
    "API_KEY",
    "UNAUTHENTICATED",
    "PERMISSION_DENIED",
    "INVALID_ARGUMENT",
];

// Matched against the lowercased message.
const NON_RETRYABLE_PHRASES: &[&str] = &[
    "unauthorized",
    "forbidden",
    "invalid api key",
    "invalid x-api-key",
    "authentication",
];

pub fn classify(err: &ChatError) -> FailureKind {
    match err {
        ChatError::Status { status, .. } => classify_status(*status),
        ChatError::Auth(_) | ChatError::InvalidRequest(_) => FailureKind::NonRetryable,
        ChatError::Transport(_) | ChatError::Decode(_) => FailureKind::Retryable,
        ChatError::Other(msg) => classify_message(msg),
    }
}

pub fn classify_status(status: u16) -> FailureKind {
    match status {
        400 | 401 | 403 | 422 => FailureKind::NonRetryable,
        _ => FailureKind::Retryable,
    }
}

pub fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    let matched = NON_RETRYABLE_SIGNATURES.iter().any(|sig| message.contains(sig)) ||
        NON_RETRYABLE_PHRASES.iter().any(|phrase| lower.contains(phrase));
    if matched {
        FailureKind::NonRetryable
    } else {
        FailureKind::Retryable
    }
}
