//! Speech recognition bridge
//!
//! - `engine`: the native engine seam and its event types
//! - `feed`: an engine driven by events forwarded from the browser
//! - `adapter`: single-run control plus transcript accumulation
//! - `errors`: engine error codes and their messages

pub mod adapter;
pub mod engine;
pub mod errors;
pub mod feed;

pub use adapter::{RecognitionAdapter, StartedRun, StoppedRun, SupportInfo, TranscriptEvent, TranscriptResult};
pub use engine::{EngineEvent, RecognitionEngine, RecognitionFeatures, RecognitionSettings, SegmentHypothesis};
pub use errors::RecognitionErrorKind;
pub use feed::{EngineFeed, FeedEngine};
