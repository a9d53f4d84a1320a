use super::client::LlmClient;
use super::messages::{AssistantReply, AssistantRequest, Message, MessageRequest};
use super::retry::RetryPolicy;
use super::suggestions::extract_suggestions;
use crate::error::ProxyError;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TOKEN_LIMIT: usize = 100_000;

/// Rough token count: one token per four characters, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Stateless handler between the UI and the upstream model
pub struct AssistantProxy {
    client: Arc<dyn LlmClient>,
    briefing: String,
    model: String,
    max_tokens: u32,
    token_limit: usize,
    retry: RetryPolicy,
}

impl AssistantProxy {
    pub fn new(client: Arc<dyn LlmClient>, briefing: impl Into<String>) -> Self {
        Self {
            client,
            briefing: briefing.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            token_limit: DEFAULT_TOKEN_LIMIT,
            retry: RetryPolicy::transient(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_token_limit(mut self, token_limit: usize) -> Self {
        self.token_limit = token_limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Briefing, plus the serialized project context when there is one
    pub fn build_system_prompt(&self, project_data: Option<&serde_json::Value>) -> String {
        let mut prompt = self.briefing.clone();

        if let Some(context) = project_data.filter(|v| !v.is_null()) {
            prompt.push_str("\n\nAdditional context for this speech: ");
            prompt.push_str(&context.to_string());
        }

        prompt
    }

    pub fn build_request(&self, message: &str, project_data: Option<&serde_json::Value>) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            system: self.build_system_prompt(project_data),
        }
    }

    /// Validate the request, call upstream and shape the reply
    pub async fn handle(&self, request: AssistantRequest) -> Result<AssistantReply, ProxyError> {
        let message = request
            .message
            .filter(|m| !m.is_empty())
            .ok_or(ProxyError::MissingMessage)?;

        let estimated = estimate_tokens(&message);
        if estimated > self.token_limit {
            warn!(
                "Message too large, rejecting request ({} estimated tokens, limit {})",
                estimated, self.token_limit
            );
            return Err(ProxyError::MessageTooLarge {
                estimated,
                limit: self.token_limit,
            });
        }

        let payload = self.build_request(&message, request.project_data.as_ref());
        info!("Calling upstream model: {}", self.model);

        let client = &self.client;
        let payload = &payload;
        let response = self
            .retry
            .run(move || client.send(payload))
            .await
            .map_err(|e| {
                error!("Upstream call failed: {}", e);
                ProxyError::from(e)
            })?;

        let text = response
            .first_text()
            .ok_or_else(|| ProxyError::Internal("upstream response has no text content".to_string()))?
            .to_string();

        info!("Received upstream response ({} chars)", text.len());

        Ok(AssistantReply {
            id: request.conversation_id.unwrap_or_else(|| "new".to_string()),
            suggestions: extract_suggestions(&text),
            response: text,
        })
    }
}
