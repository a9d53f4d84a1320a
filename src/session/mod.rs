//! Transcription session management
//!
//! This module provides the `SessionManager` that handles:
//! - Session identity and the single-active-session guard
//! - Start/stop/abort delegation to the recognition adapter
//! - Live transcript updates for subscribers
//! - Reaping of completed sessions
//! - Saving transcripts into project requirements

mod patch;
mod record;
mod session;

pub use patch::{RequirementsField, RequirementsPatch, SaveTranscriptionRequest, SavedTranscription};
pub use record::{SessionStatus, StoppedTranscript, TranscriptionSession};
pub use session::{SessionManager, SessionUpdate};
