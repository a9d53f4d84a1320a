use super::handlers;
use super::state::AppState;
use axum::{
    routing::{any, get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Transcription control
        .route("/transcription/support", get(handlers::check_support))
        .route(
            "/transcription/sessions",
            get(handlers::list_sessions).post(handlers::start_session),
        )
        .route(
            "/transcription/sessions/:session_id/stop",
            post(handlers::stop_session),
        )
        .route(
            "/transcription/sessions/:session_id/abort",
            post(handlers::abort_session),
        )
        .route("/transcription/transcript", get(handlers::current_transcript))
        .route("/transcription/feed", post(handlers::push_recognition_event))
        .route("/transcription/events", get(handlers::transcription_events))
        .route("/transcription/save", post(handlers::save_transcription))
        // Assistant proxy (method checked by the handler)
        .route("/assistant", any(handlers::assistant))
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/:project_id",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/projects/:project_id/requirements",
            put(handlers::save_requirements),
        )
        .route("/projects/:project_id/drafts", post(handlers::save_draft))
        .route("/drafts/:draft_id", patch(handlers::update_draft))
        // Browser UI is served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
