// Shared doubles for integration tests
//
// - ScriptedLlm: upstream model that replays canned outcomes and counts calls
// - TrackingStore: in-memory store that counts every call made to it

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use toastmaster::assistant::{ContentBlock, LlmClient, MessageRequest, MessageResponse};
use toastmaster::recognition::{EngineEvent, SegmentHypothesis};
use toastmaster::session::SessionUpdate;
use toastmaster::storage::{
    Draft, MemoryStore, NewDraft, Project, ProjectStore, ProjectUpdate, Requirements, RequirementsUpdate, StoreResult,
};
use toastmaster::{EngineFeed, FeedEngine, RecognitionAdapter, SessionManager, UpstreamError};

pub const BRIEFING: &str = "You help people write wedding speeches.";

pub fn text_response(text: &str) -> MessageResponse {
    MessageResponse {
        content: vec![ContentBlock {
            content_type: Some("text".to_string()),
            text: Some(text.to_string()),
        }],
        model: None,
        stop_reason: None,
    }
}

pub fn status_error(status: u16) -> UpstreamError {
    UpstreamError::Status {
        status,
        body: format!("{{\"error\":\"status {}\"}}", status),
    }
}

pub struct ScriptedLlm {
    outcomes: Mutex<VecDeque<Result<MessageResponse, UpstreamError>>>,
    requests: Mutex<Vec<MessageRequest>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(outcomes: Vec<Result<MessageResponse, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(text_response(text))])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Transport("script exhausted".to_string())))
    }
}

/// Memory store that counts calls
#[derive(Default)]
pub struct TrackingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    /// Pause inside `get_requirements`, widening the read-to-write window
    read_delay: Option<Duration>,
}

impl TrackingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_read_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            read_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectStore for TrackingStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.hit();
        self.inner.list_projects().await
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        self.hit();
        self.inner.get_project(id).await
    }

    async fn insert_project(&self, title: &str) -> StoreResult<Project> {
        self.hit();
        self.inner.insert_project(title).await
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> StoreResult<Project> {
        self.hit();
        self.inner.update_project(id, update).await
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.hit();
        self.inner.delete_project(id).await
    }

    async fn get_requirements(&self, project_id: &str) -> StoreResult<Option<Requirements>> {
        self.hit();
        let requirements = self.inner.get_requirements(project_id).await;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        requirements
    }

    async fn insert_requirements(&self, project_id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        self.hit();
        self.inner.insert_requirements(project_id, fields).await
    }

    async fn update_requirements(&self, id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        self.hit();
        self.inner.update_requirements(id, fields).await
    }

    async fn list_drafts(&self, project_id: &str) -> StoreResult<Vec<Draft>> {
        self.hit();
        self.inner.list_drafts(project_id).await
    }

    async fn insert_draft(&self, draft: &NewDraft) -> StoreResult<Draft> {
        self.hit();
        self.inner.insert_draft(draft).await
    }

    async fn update_draft(&self, id: &str, content: &str) -> StoreResult<Draft> {
        self.hit();
        self.inner.update_draft(id, content).await
    }
}

/// Session manager over a feed engine, plus the feed handle
pub fn feed_manager(store: Arc<dyn ProjectStore>) -> (SessionManager, EngineFeed) {
    let engine = FeedEngine::new();
    let feed = engine.feed();
    (SessionManager::new(RecognitionAdapter::new(Box::new(engine)), store), feed)
}

pub fn interim(text: &str) -> EngineEvent {
    EngineEvent::Result {
        results: vec![SegmentHypothesis {
            transcript: text.to_string(),
            confidence: 0.0,
            is_final: false,
        }],
    }
}

pub fn final_segment(text: &str, confidence: f32) -> EngineEvent {
    EngineEvent::Result {
        results: vec![SegmentHypothesis {
            transcript: text.to_string(),
            confidence,
            is_final: true,
        }],
    }
}

/// Next live update, failing the test if none arrives promptly
pub async fn next_update(updates: &mut broadcast::Receiver<SessionUpdate>) -> SessionUpdate {
    tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("timed out waiting for a session update")
        .expect("update channel closed")
}
