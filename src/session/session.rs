use super::patch::{RequirementsPatch, SaveTranscriptionRequest, SavedTranscription};
use super::record::{StoppedTranscript, TranscriptionSession};
use crate::error::TranscriptionError;
use crate::recognition::{RecognitionAdapter, RecognitionSettings, SupportInfo, TranscriptEvent, TranscriptResult};
use crate::storage::ProjectStore;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Capacity of the live update broadcast
const UPDATE_BUFFER: usize = 128;

/// Default age after which an active session is reported as stale
const DEFAULT_MAX_SESSION_AGE_SECS: i64 = 3600;

type SessionMap = Arc<RwLock<HashMap<String, TranscriptionSession>>>;

/// Transcript event tagged with the session it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    pub session_id: String,
    #[serde(flatten)]
    pub event: TranscriptEvent,
}

/// Owns the recognition adapter and the session registry
///
/// All adapter calls go through the manager, which holds the adapter lock
/// for the whole check-then-act sequence. This keeps at most one session
/// active at a time.
pub struct SessionManager {
    /// Exclusive handle on the recognition engine
    adapter: Mutex<RecognitionAdapter>,

    /// Known sessions (session_id → session)
    sessions: SessionMap,

    /// Store for saving transcripts into project requirements
    store: Arc<dyn ProjectStore>,

    /// Settings used when a caller does not override them
    defaults: RecognitionSettings,

    max_session_age: chrono::Duration,

    updates: broadcast::Sender<SessionUpdate>,

    /// Serializes the read-merge-write of requirements rows
    save_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(adapter: RecognitionAdapter, store: Arc<dyn ProjectStore>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);

        Self {
            adapter: Mutex::new(adapter),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            defaults: RecognitionSettings::default(),
            max_session_age: chrono::Duration::seconds(DEFAULT_MAX_SESSION_AGE_SECS),
            updates,
            save_lock: Mutex::new(()),
        }
    }

    pub fn with_defaults(mut self, defaults: RecognitionSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_max_session_age(mut self, max_age: chrono::Duration) -> Self {
        self.max_session_age = max_age;
        self
    }

    pub fn defaults(&self) -> &RecognitionSettings {
        &self.defaults
    }

    pub async fn check_support(&self) -> SupportInfo {
        self.adapter.lock().await.check_support()
    }

    /// Live transcript updates for all sessions
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Transcript of the current (or most recent) run
    pub async fn current_transcript(&self) -> TranscriptResult {
        self.adapter.lock().await.snapshot()
    }

    /// Start a recognition run and register it as the active session
    pub async fn start_session(&self, settings: &RecognitionSettings) -> Result<TranscriptionSession, TranscriptionError> {
        let mut adapter = self.adapter.lock().await;

        if !adapter.check_support().supported {
            return Err(TranscriptionError::Unsupported);
        }

        {
            let sessions = self.sessions.read().await;
            if let Some(active) = sessions.values().find(|s| s.is_active()) {
                warn!("Refusing to start: session {} is still active", active.id);
                return Err(TranscriptionError::AlreadyActive);
            }
        }

        let run = adapter.start(settings).await?;
        let session = TranscriptionSession::start(run.session_id.clone());

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.id.clone(), session.clone());
        }

        tokio::spawn(forward_events(
            session.id.clone(),
            run.events,
            Arc::clone(&self.sessions),
            self.updates.clone(),
        ));

        info!("Transcription session started: {}", session.id);
        Ok(session)
    }

    /// Stop the session's run and mark it completed
    pub async fn stop_session(&self, session_id: &str) -> Result<StoppedTranscript, TranscriptionError> {
        let mut adapter = self.adapter.lock().await;

        self.ensure_active(session_id).await?;

        let stopped = match adapter.stop().await {
            Ok(stopped) => stopped,
            Err(TranscriptionError::NotRecognizing) => {
                // Engine failed without ending the run
                warn!("Session {} has no live recognition run, completing it", session_id);
                self.complete(session_id).await;
                return Err(TranscriptionError::NotRecognizing);
            }
            Err(e) => return Err(e),
        };

        self.complete(session_id).await;

        info!(
            "Transcription session stopped: {} ({} chars, confidence {:.2})",
            session_id,
            stopped.transcript.len(),
            stopped.confidence
        );

        Ok(StoppedTranscript {
            transcription: stopped.transcript,
            confidence: stopped.confidence,
        })
    }

    /// Abort the session's run without waiting for final results
    pub async fn abort_session(&self, session_id: &str) -> Result<(), TranscriptionError> {
        let mut adapter = self.adapter.lock().await;

        self.ensure_active(session_id).await?;

        adapter.abort();
        self.complete(session_id).await;

        info!("Transcription session aborted: {}", session_id);
        Ok(())
    }

    async fn complete(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.complete();
        }
    }

    async fn ensure_active(&self, session_id: &str) -> Result<(), TranscriptionError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            None => Err(TranscriptionError::SessionNotFound(session_id.to_string())),
            Some(session) if !session.is_active() => Err(TranscriptionError::NotRecognizing),
            Some(_) => Ok(()),
        }
    }

    pub async fn list_active_sessions(&self) -> Vec<TranscriptionSession> {
        let sessions = self.sessions.read().await;
        let mut active: Vec<_> = sessions.values().filter(|s| s.is_active()).cloned().collect();
        active.sort_by_key(|s| s.start_time);
        active
    }

    /// Drop completed sessions from the registry
    ///
    /// Active sessions are never removed, whatever their age. Ones older
    /// than the maximum age are reported as stale.
    pub async fn reap_stale_sessions(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| {
            if session.is_active() {
                if session.age(now) > self.max_session_age {
                    warn!(
                        "Session {} has been active for {}s",
                        id,
                        session.age(now).num_seconds()
                    );
                }
                true
            } else {
                debug!("Reaping completed session {}", id);
                false
            }
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Reaped {} completed session(s)", removed);
        }
        removed
    }

    /// Merge a transcript into a project's requirements
    pub async fn save_transcription(&self, request: SaveTranscriptionRequest) -> Result<SavedTranscription, TranscriptionError> {
        let patch = RequirementsPatch::try_from(request)?;

        let _guard = self.save_lock.lock().await;

        if self.store.get_project(&patch.project_id).await?.is_none() {
            return Err(TranscriptionError::ProjectNotFound(patch.project_id));
        }

        let current = self.store.get_requirements(&patch.project_id).await?;
        let update = patch.to_update(current.as_ref());

        match current {
            Some(existing) => {
                self.store.update_requirements(&existing.id, &update).await?;
            }
            None => {
                self.store.insert_requirements(&patch.project_id, &update).await?;
            }
        }

        info!(
            "Saved transcription into {} for project {}",
            patch.field.as_str(),
            patch.project_id
        );

        Ok(SavedTranscription {
            project_id: patch.project_id,
            updated_field: patch.field,
        })
    }
}

/// Relay a run's events to subscribers, completing the session when the engine ends
async fn forward_events(
    session_id: String,
    mut events: mpsc::Receiver<TranscriptEvent>,
    sessions: SessionMap,
    updates: broadcast::Sender<SessionUpdate>,
) {
    while let Some(event) = events.recv().await {
        let ended = event == TranscriptEvent::Ended;

        if ended {
            let mut sessions = sessions.write().await;
            if let Some(session) = sessions.get_mut(&session_id) {
                if session.is_active() {
                    info!("Session {} ended by the recognition engine", session_id);
                    session.complete();
                }
            }
        }

        // No subscribers is not an error
        let _ = updates.send(SessionUpdate {
            session_id: session_id.clone(),
            event,
        });

        if ended {
            break;
        }
    }
}
