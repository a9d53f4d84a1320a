use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Features a recognition engine advertises when it is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionFeatures {
    /// Keeps listening across pauses
    pub continuous: bool,
    /// Emits partial hypotheses before a segment is final
    pub interim_results: bool,
}

/// Settings applied to a single recognition run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Keep listening across pauses (default: true)
    pub continuous: bool,
    /// Emit partial hypotheses (default: true)
    pub interim_results: bool,
    /// BCP-47 locale tag
    pub lang: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            lang: "en-US".to_string(),
        }
    }
}

/// One hypothesis for a segment of speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentHypothesis {
    /// Recognized text
    pub transcript: String,
    /// Confidence score (0.0 to 1.0), only meaningful on final segments
    #[serde(default)]
    pub confidence: f32,
    /// Whether the engine will revise this segment further
    #[serde(default)]
    pub is_final: bool,
}

/// Event emitted by a native recognition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineEvent {
    /// Segments changed since the previous result event
    Result { results: Vec<SegmentHypothesis> },
    /// Engine-native error code (e.g. "no-speech")
    Error { error: String },
    /// Engine has actually stopped
    End,
}

/// Native speech recognition capability
///
/// Only one run may be live at a time; callers serialize access through
/// the recognition adapter.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Capability probe, `None` when recognition is unavailable
    fn capabilities(&self) -> Option<RecognitionFeatures>;

    /// Begin a run
    ///
    /// Returns a channel receiver that will receive native events, ending with `End`
    async fn start(&mut self, settings: &RecognitionSettings) -> Result<mpsc::Receiver<EngineEvent>>;

    /// Request a graceful stop; `End` follows any pending results
    async fn stop(&mut self) -> Result<()>;

    /// Terminate immediately without waiting for final results
    fn abort(&mut self);

    /// Get engine name for logging
    fn name(&self) -> &str;
}
