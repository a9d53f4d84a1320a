use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Bookkeeping for one recognition run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSession {
    /// Opaque session token, unique for the process lifetime
    pub id: String,

    /// When the recognition run started
    pub start_time: DateTime<Utc>,

    pub status: SessionStatus,

    /// Set when the session completes
    pub end_time: Option<DateTime<Utc>>,
}

impl TranscriptionSession {
    pub fn start(id: String) -> Self {
        Self {
            id,
            start_time: Utc::now(),
            status: SessionStatus::Active,
            end_time: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn complete(&mut self) {
        if self.is_active() {
            self.status = SessionStatus::Completed;
            self.end_time = Some(Utc::now());
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.start_time)
    }
}

/// Transcript returned when a session is stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppedTranscript {
    pub transcription: String,
    pub confidence: f32,
}
