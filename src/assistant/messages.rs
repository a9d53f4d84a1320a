use serde::{Deserialize, Serialize};

/// Inbound assistant request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Project requirements or any other structured context
    #[serde(default)]
    pub project_data: Option<serde_json::Value>,
}

/// Successful assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub id: String,
    pub response: String,
    pub suggestions: Vec<String>,
}

/// Body sent to the upstream messages endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    pub system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageResponse {
    /// Text of the first content block
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|block| block.text.as_deref())
    }
}
