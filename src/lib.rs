pub mod assistant;
pub mod config;
pub mod error;
pub mod http;
pub mod recognition;
pub mod session;
pub mod storage;

pub use assistant::{AssistantProxy, AssistantReply, AssistantRequest, LlmClient, RetryPolicy};
pub use config::Config;
pub use error::{ProxyError, TranscriptionError, UpstreamError};
pub use http::{create_router, AppState};
pub use recognition::{
    EngineEvent, EngineFeed, FeedEngine, RecognitionAdapter, RecognitionEngine, RecognitionSettings, TranscriptEvent,
    TranscriptResult,
};
pub use session::{RequirementsPatch, SessionManager, SessionStatus, TranscriptionSession};
pub use storage::{MemoryStore, PostgrestStore, ProjectStore, Projects};
