//! Error taxonomy shared by the transcription core and the assistant proxy

use thiserror::Error;

use crate::storage::StoreError;

/// Failures surfaced by the recognition adapter and the session manager
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Speech recognition is not supported")]
    Unsupported,

    #[error("A transcription session is already active")]
    AlreadyActive,

    #[error("No active transcription session")]
    NotRecognizing,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Recognition engine error: {0}")]
    Engine(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid field value '{0}'. Must be \"additional_context\" or \"key_anecdotes\".")]
    InvalidField(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of a single assistant proxy invocation
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Message is required")]
    MissingMessage,

    #[error("Message too large, exceeds token limit")]
    MessageTooLarge { estimated: usize, limit: usize },

    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    #[error("Authentication error with the language model API")]
    Unauthenticated,

    #[error("Error processing request")]
    Internal(String),
}

/// Failures talking to the upstream LLM
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Connection resets and rate limits are worth one more attempt
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::ConnectionReset(_) => true,
            UpstreamError::Status { status, .. } => *status == 429,
            _ => false,
        }
    }
}

impl From<UpstreamError> for ProxyError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status: 429, .. } => ProxyError::RateLimited,
            UpstreamError::Status { status: 401, .. } => ProxyError::Unauthenticated,
            other => ProxyError::Internal(other.to_string()),
        }
    }
}
