//! Speech assistant proxy
//!
//! Turns a user message plus optional project context into a completion
//! from the upstream model, with input size limits, a bounded retry and
//! follow-up question extraction.

pub mod client;
pub mod messages;
pub mod proxy;
pub mod retry;
pub mod suggestions;

pub use client::{AnthropicClient, LlmClient};
pub use messages::{AssistantReply, AssistantRequest, ContentBlock, Message, MessageRequest, MessageResponse};
pub use proxy::{estimate_tokens, AssistantProxy};
pub use retry::RetryPolicy;
pub use suggestions::extract_suggestions;
