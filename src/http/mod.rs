//! HTTP API for the browser UI
//!
//! This module provides a REST API over the speech assistant:
//! - /transcription/* - Recognition support, session control, live events, saving
//! - /assistant - Proxy to the upstream language model
//! - /projects, /drafts - Project, requirements and draft storage
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
