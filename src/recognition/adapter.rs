use super::engine::{EngineEvent, RecognitionEngine, RecognitionFeatures, RecognitionSettings, SegmentHypothesis};
use super::errors::RecognitionErrorKind;
use crate::error::TranscriptionError;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the transcript event channel handed to the consumer
const EVENT_BUFFER: usize = 256;

/// Transcript update produced by the adapter, in engine order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranscriptEvent {
    /// Current unfinished hypothesis, replacing any previous one
    Interim { text: String },
    /// A segment the engine will not revise
    Final { text: String, confidence: f32 },
    /// Engine reported an error
    Error { error: RecognitionErrorKind },
    /// Engine has actually stopped
    Ended,
}

/// Snapshot of the accumulated transcript for the current run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptResult {
    pub final_text: String,
    pub interim_text: String,
    pub is_final: bool,
    pub confidence: f32,
}

/// Capability probe result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportInfo {
    pub supported: bool,
    pub features: Option<RecognitionFeatures>,
}

/// A run that was started successfully
#[derive(Debug)]
pub struct StartedRun {
    pub session_id: String,
    pub events: mpsc::Receiver<TranscriptEvent>,
}

/// Transcript state captured when a run was asked to stop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppedRun {
    pub session_id: String,
    pub transcript: String,
    pub confidence: f32,
}

#[derive(Debug, Default)]
struct TranscriptState {
    /// Bumped on every start so late events from an older run are ignored
    generation: u64,
    session_id: Option<String>,
    final_text: String,
    interim_text: String,
    confidence: f32,
    running: bool,
}

impl TranscriptState {
    fn reset(&mut self, session_id: &str) {
        self.generation += 1;
        self.session_id = Some(session_id.to_string());
        self.final_text.clear();
        self.interim_text.clear();
        self.confidence = 0.0;
        self.running = true;
    }

    fn apply(&mut self, results: &[SegmentHypothesis]) -> Vec<TranscriptEvent> {
        let mut events = Vec::new();
        let mut interim = String::new();

        for segment in results {
            if segment.is_final {
                self.final_text.push_str(&segment.transcript);
                self.final_text.push(' ');
                self.confidence = segment.confidence;
                events.push(TranscriptEvent::Final {
                    text: segment.transcript.clone(),
                    confidence: segment.confidence,
                });
            } else {
                interim.push_str(&segment.transcript);
            }
        }

        self.interim_text = interim.trim().to_string();
        if !self.interim_text.is_empty() {
            events.push(TranscriptEvent::Interim {
                text: self.interim_text.clone(),
            });
        }

        events
    }

    fn snapshot(&self) -> TranscriptResult {
        TranscriptResult {
            final_text: self.final_text.clone(),
            interim_text: self.interim_text.clone(),
            is_final: self.interim_text.is_empty(),
            confidence: self.confidence,
        }
    }
}

/// Bridge to the native recognition engine
///
/// Owns the single engine instance and the transcript accumulated for the
/// current run. The session manager is its only caller.
pub struct RecognitionAdapter {
    engine: Box<dyn RecognitionEngine>,
    state: Arc<Mutex<TranscriptState>>,
}

impl RecognitionAdapter {
    pub fn new(engine: Box<dyn RecognitionEngine>) -> Self {
        Self {
            engine,
            state: Arc::new(Mutex::new(TranscriptState::default())),
        }
    }

    pub fn check_support(&self) -> SupportInfo {
        let features = self.engine.capabilities();
        SupportInfo {
            supported: features.is_some(),
            features,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn snapshot(&self) -> TranscriptResult {
        self.state.lock().snapshot()
    }

    /// Start a run with fresh transcript state and a new session identifier
    pub async fn start(&mut self, settings: &RecognitionSettings) -> Result<StartedRun, TranscriptionError> {
        if self.engine.capabilities().is_none() {
            return Err(TranscriptionError::Unsupported);
        }
        if self.is_running() {
            return Err(TranscriptionError::AlreadyActive);
        }

        let session_id = format!("session-{}", uuid::Uuid::new_v4());

        let native = self
            .engine
            .start(settings)
            .await
            .map_err(|e| TranscriptionError::Engine(e.to_string()))?;

        let generation = {
            let mut state = self.state.lock();
            state.reset(&session_id);
            state.generation
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(pump_events(native, tx, Arc::clone(&self.state), generation));

        info!("Recognition run started on {} engine: {}", self.engine.name(), session_id);

        Ok(StartedRun {
            session_id,
            events: rx,
        })
    }

    /// Request a graceful stop
    ///
    /// Results still in flight are applied after this returns.
    pub async fn stop(&mut self) -> Result<StoppedRun, TranscriptionError> {
        if !self.is_running() {
            return Err(TranscriptionError::NotRecognizing);
        }

        self.engine
            .stop()
            .await
            .map_err(|e| TranscriptionError::Engine(e.to_string()))?;

        let mut state = self.state.lock();
        state.running = false;

        Ok(StoppedRun {
            session_id: state.session_id.clone().unwrap_or_default(),
            transcript: state.final_text.clone(),
            confidence: state.confidence,
        })
    }

    /// Terminate the current run without waiting for final results
    pub fn abort(&mut self) {
        if self.is_running() {
            self.engine.abort();
            self.state.lock().running = false;
        }
    }
}

async fn pump_events(
    mut native: mpsc::Receiver<EngineEvent>,
    tx: mpsc::Sender<TranscriptEvent>,
    state: Arc<Mutex<TranscriptState>>,
    generation: u64,
) {
    let mut ended = false;

    while let Some(event) = native.recv().await {
        let outgoing = {
            let mut state = state.lock();
            let current = state.generation == generation;

            match event {
                EngineEvent::Result { results } if current => state.apply(&results),
                EngineEvent::Result { .. } => Vec::new(),
                EngineEvent::Error { error } => {
                    let kind = RecognitionErrorKind::from_code(&error);
                    warn!("Recognition error: {}", kind.message());
                    if current {
                        state.running = false;
                    }
                    vec![TranscriptEvent::Error { error: kind }]
                }
                EngineEvent::End => {
                    if current {
                        state.running = false;
                    }
                    ended = true;
                    vec![TranscriptEvent::Ended]
                }
            }
        };

        for event in outgoing {
            if tx.send(event).await.is_err() {
                debug!("Transcript consumer dropped");
            }
        }

        if ended {
            break;
        }
    }

    if !ended {
        // Engine dropped its sender without an explicit end
        {
            let mut state = state.lock();
            if state.generation == generation {
                state.running = false;
            }
        }
        let _ = tx.send(TranscriptEvent::Ended).await;
    }

    debug!("Recognition event pump finished (generation {})", generation);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interim(text: &str) -> SegmentHypothesis {
        SegmentHypothesis {
            transcript: text.to_string(),
            confidence: 0.0,
            is_final: false,
        }
    }

    fn fin(text: &str, confidence: f32) -> SegmentHypothesis {
        SegmentHypothesis {
            transcript: text.to_string(),
            confidence,
            is_final: true,
        }
    }

    #[test]
    fn test_interim_replaced_final_accumulates() {
        let mut state = TranscriptState::default();
        state.reset("s1");

        state.apply(&[interim("hel")]);
        assert_eq!(state.snapshot().interim_text, "hel");
        state.apply(&[interim("hello")]);
        assert_eq!(state.snapshot().interim_text, "hello");

        let events = state.apply(&[fin("hello world", 0.9)]);
        assert_eq!(
            events,
            vec![TranscriptEvent::Final {
                text: "hello world".to_string(),
                confidence: 0.9
            }]
        );

        let snapshot = state.snapshot();
        assert_eq!(snapshot.final_text, "hello world ");
        assert_eq!(snapshot.confidence, 0.9);
        assert!(snapshot.is_final);
        assert!(snapshot.interim_text.is_empty());
    }

    #[test]
    fn test_confidence_tracks_latest_final_segment() {
        let mut state = TranscriptState::default();
        state.reset("s1");

        state.apply(&[fin("first", 0.7), fin("second", 0.95), interim("thi")]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.final_text, "first second ");
        assert_eq!(snapshot.confidence, 0.95);
        assert_eq!(snapshot.interim_text, "thi");
        assert!(!snapshot.is_final);
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let mut state = TranscriptState::default();
        state.reset("s1");
        state.apply(&[fin("old words", 0.5)]);

        state.reset("s2");

        assert_eq!(state.generation, 2);
        assert_eq!(state.session_id.as_deref(), Some("s2"));
        assert_eq!(state.snapshot().final_text, "");
        assert_eq!(state.snapshot().confidence, 0.0);
    }
}
