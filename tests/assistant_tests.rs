mod common;

use anyhow::Result;
use common::{status_error, text_response, ScriptedLlm, BRIEFING};
use serde_json::json;
use std::sync::Arc;
use toastmaster::assistant::MessageResponse;
use toastmaster::{AssistantProxy, AssistantRequest, ProxyError, UpstreamError};

fn proxy(llm: &Arc<ScriptedLlm>) -> AssistantProxy {
    AssistantProxy::new(llm.clone(), BRIEFING)
}

fn ask(message: &str) -> AssistantRequest {
    AssistantRequest {
        message: Some(message.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_reply_carries_suggestions_and_default_id() -> Result<()> {
    let llm = ScriptedLlm::answering("What is their story? Any jokes you'd like to include?");

    let reply = proxy(&llm).handle(ask("Help me start")).await?;

    assert_eq!(reply.id, "new");
    assert_eq!(reply.response, "What is their story? Any jokes you'd like to include?");
    assert_eq!(
        reply.suggestions,
        vec!["What is their story?", "Any jokes you'd like to include?"]
    );
    assert_eq!(llm.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reply_echoes_conversation_id() -> Result<()> {
    let llm = ScriptedLlm::answering("Lovely. Tell me more.");

    let reply = proxy(&llm)
        .handle(AssistantRequest {
            conversation_id: Some("conv-42".to_string()),
            message: Some("We met at university".to_string()),
            project_data: None,
        })
        .await?;

    assert_eq!(reply.id, "conv-42");
    assert!(reply.suggestions.is_empty(), "No questions in the reply");
    Ok(())
}

#[tokio::test]
async fn test_upstream_request_shape() -> Result<()> {
    let llm = ScriptedLlm::answering("Sure.");

    proxy(&llm).handle(ask("Draft an opening line")).await?;

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "claude-3-7-sonnet-20250219");
    assert_eq!(request.max_tokens, 1000);
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, "user");
    assert_eq!(request.messages[0].content, "Draft an opening line");
    assert_eq!(request.system, BRIEFING);
    Ok(())
}

#[tokio::test]
async fn test_project_data_appended_to_system_prompt() -> Result<()> {
    let llm = ScriptedLlm::answering("Sure.");

    proxy(&llm)
        .handle(AssistantRequest {
            conversation_id: None,
            message: Some("hi".to_string()),
            project_data: Some(json!({"role": "Best man"})),
        })
        .await?;

    let system = &llm.requests()[0].system;
    assert!(system.starts_with(BRIEFING));
    assert!(
        system.ends_with("\n\nAdditional context for this speech: {\"role\":\"Best man\"}"),
        "Unexpected system prompt: {}",
        system
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_or_empty_message() {
    let llm = ScriptedLlm::answering("unused");
    let proxy = proxy(&llm);

    let missing = proxy.handle(AssistantRequest::default()).await;
    let empty = proxy.handle(ask("")).await;

    assert!(matches!(missing, Err(ProxyError::MissingMessage)), "Got {:?}", missing);
    assert!(matches!(empty, Err(ProxyError::MissingMessage)), "Got {:?}", empty);
    assert_eq!(llm.calls(), 0, "Upstream must not be called");
}

#[tokio::test]
async fn test_oversized_message_rejected_without_upstream_call() {
    // 400_004 characters estimate to 100_001 tokens
    let llm = ScriptedLlm::answering("unused");

    let result = proxy(&llm).handle(ask(&"a".repeat(400_004))).await;

    match result {
        Err(ProxyError::MessageTooLarge { estimated, limit }) => {
            assert_eq!(estimated, 100_001);
            assert_eq!(limit, 100_000);
        }
        other => panic!("Expected MessageTooLarge, got {:?}", other),
    }
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_message_at_limit_is_accepted() -> Result<()> {
    let llm = ScriptedLlm::answering("ok");

    proxy(&llm).handle(ask(&"a".repeat(400_000))).await?;

    assert_eq!(llm.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_retried_once_then_surfaced() {
    let llm = ScriptedLlm::new(vec![Err(status_error(429)), Err(status_error(429))]);

    let result = proxy(&llm).handle(ask("hello")).await;

    assert!(matches!(result, Err(ProxyError::RateLimited)), "Got {:?}", result);
    assert_eq!(llm.calls(), 2, "Exactly one retry");
}

#[tokio::test]
async fn test_rate_limit_recovered_by_identical_retry() -> Result<()> {
    let llm = ScriptedLlm::new(vec![Err(status_error(429)), Ok(text_response("Recovered."))]);

    let reply = proxy(&llm).handle(ask("hello")).await?;

    assert_eq!(reply.response, "Recovered.");
    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1], "Retry must resend the same payload");
    Ok(())
}

#[tokio::test]
async fn test_connection_reset_is_retried() -> Result<()> {
    let llm = ScriptedLlm::new(vec![
        Err(UpstreamError::ConnectionReset("peer reset".to_string())),
        Ok(text_response("Back again.")),
    ]);

    let reply = proxy(&llm).handle(ask("hello")).await?;

    assert_eq!(reply.response, "Back again.");
    assert_eq!(llm.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unauthenticated_is_not_retried() {
    let llm = ScriptedLlm::new(vec![Err(status_error(401)), Ok(text_response("unused"))]);

    let result = proxy(&llm).handle(ask("hello")).await;

    assert!(matches!(result, Err(ProxyError::Unauthenticated)), "Got {:?}", result);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_server_error_maps_to_internal_with_details() {
    let llm = ScriptedLlm::new(vec![Err(status_error(500))]);

    let result = proxy(&llm).handle(ask("hello")).await;

    match result {
        Err(ProxyError::Internal(details)) => assert!(details.contains("500"), "Details: {}", details),
        other => panic!("Expected Internal, got {:?}", other),
    }
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_response_without_text_is_internal() {
    let llm = ScriptedLlm::new(vec![Ok(MessageResponse {
        content: Vec::new(),
        model: None,
        stop_reason: None,
    })]);

    let result = proxy(&llm).handle(ask("hello")).await;

    assert!(matches!(result, Err(ProxyError::Internal(_))), "Got {:?}", result);
}

#[tokio::test]
async fn test_suggestions_capped_at_three() -> Result<()> {
    let llm = ScriptedLlm::answering("Who? What? When? Where? Why?");

    let reply = proxy(&llm).handle(ask("hello")).await?;

    assert_eq!(reply.suggestions, vec!["Who?", "What?", "When?"]);
    Ok(())
}
