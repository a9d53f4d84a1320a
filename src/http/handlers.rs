use super::state::AppState;
use crate::assistant::AssistantRequest;
use crate::error::{ProxyError, TranscriptionError};
use crate::recognition::{EngineEvent, RecognitionFeatures, RecognitionSettings, TranscriptResult};
use crate::session::{RequirementsField, SaveTranscriptionRequest, TranscriptionSession};
use crate::storage::{Draft, Project, ProjectDetails, ProjectUpdate, Requirements, RequirementsUpdate, StoreError};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::Stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub continuous: Option<bool>,
    pub interim_results: Option<bool>,
    pub lang: Option<String>,
}

impl StartSessionRequest {
    fn settings(self, defaults: &RecognitionSettings) -> RecognitionSettings {
        RecognitionSettings {
            continuous: self.continuous.unwrap_or(defaults.continuous),
            interim_results: self.interim_results.unwrap_or(defaults.interim_results),
            lang: self.lang.unwrap_or_else(|| defaults.lang.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SupportResponse {
    pub success: bool,
    pub supported: bool,
    pub features: Option<RecognitionFeatures>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: TranscriptionSession,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub transcription: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<TranscriptionSession>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub success: bool,
    #[serde(flatten)]
    pub transcript: TranscriptResult,
}

#[derive(Debug, Serialize)]
pub struct SaveTranscriptionResponse {
    pub success: bool,
    pub project_id: String,
    pub updated_field: RequirementsField,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub content: String,
    #[serde(default)]
    pub user_edited: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailsResponse {
    pub success: bool,
    pub project: ProjectDetails,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub success: bool,
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub success: bool,
    pub requirements: Requirements,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub success: bool,
    pub draft: Draft,
}

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

/// JSON body whose rejections use the `{success: false, error}` shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                Err(failure(rejection.status(), rejection.body_text()))
            }
        }
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                error!("Store failure: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        failure(status, self.to_string())
    }
}

impl IntoResponse for TranscriptionError {
    fn into_response(self) -> Response {
        if let TranscriptionError::Store(e) = self {
            return e.into_response();
        }

        let status = match &self {
            TranscriptionError::Unsupported => StatusCode::NOT_IMPLEMENTED,
            TranscriptionError::AlreadyActive | TranscriptionError::NotRecognizing => StatusCode::CONFLICT,
            TranscriptionError::SessionNotFound(_) | TranscriptionError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            TranscriptionError::MissingParameter(_) | TranscriptionError::InvalidField(_) => StatusCode::BAD_REQUEST,
            TranscriptionError::Engine(_) | TranscriptionError::Store(_) => {
                error!("Recognition engine failure: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        failure(status, self.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ProxyErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MethodNotAllowed => {
                return (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, "POST")],
                    Json(ProxyErrorBody {
                        error: self.to_string(),
                        details: None,
                    }),
                )
                    .into_response();
            }
            ProxyError::MissingMessage | ProxyError::MessageTooLarge { .. } => StatusCode::BAD_REQUEST,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &self {
            ProxyError::Internal(details) => Some(details.clone()),
            _ => None,
        };

        (
            status,
            Json(ProxyErrorBody {
                error: self.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Transcription Handlers
// ============================================================================

/// GET /transcription/support
pub async fn check_support(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.sessions.check_support().await;
    Json(SupportResponse {
        success: true,
        supported: info.supported,
        features: info.features,
    })
}

/// POST /transcription/sessions
/// Start a new transcription session (body optional)
pub async fn start_session(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        StartSessionRequest::default()
    } else {
        match serde_json::from_slice::<StartSessionRequest>(&body) {
            Ok(request) => request,
            Err(e) => return failure(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)),
        }
    };

    let settings = request.settings(state.sessions.defaults());

    match state.sessions.start_session(&settings).await {
        Ok(session) => (
            StatusCode::OK,
            Json(StartSessionResponse {
                success: true,
                session,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to start transcription session: {}", e);
            e.into_response()
        }
    }
}

/// GET /transcription/sessions
/// List active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(SessionsResponse {
        success: true,
        sessions: state.sessions.list_active_sessions().await,
    })
}

/// POST /transcription/sessions/:session_id/stop
pub async fn stop_session(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    match state.sessions.stop_session(&session_id).await {
        Ok(stopped) => Json(StopSessionResponse {
            success: true,
            session_id,
            transcription: stopped.transcription,
            confidence: stopped.confidence,
        })
        .into_response(),
        Err(e) => {
            warn!("Failed to stop session {}: {}", session_id, e);
            e.into_response()
        }
    }
}

/// POST /transcription/sessions/:session_id/abort
pub async fn abort_session(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    match state.sessions.abort_session(&session_id).await {
        Ok(()) => Json(SuccessResponse { success: true }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /transcription/transcript
/// Accumulated transcript of the current or last run
pub async fn current_transcript(State(state): State<AppState>) -> impl IntoResponse {
    Json(TranscriptResponse {
        success: true,
        transcript: state.sessions.current_transcript().await,
    })
}

/// POST /transcription/feed
/// Recognition events forwarded from the browser's speech engine
pub async fn push_recognition_event(State(state): State<AppState>, JsonBody(event): JsonBody<EngineEvent>) -> Response {
    match state.feed.push(event).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => failure(StatusCode::CONFLICT, e.to_string()),
    }
}

/// GET /transcription/events
/// Live transcript updates as server-sent events
pub async fn transcription_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.sessions.subscribe();

    let stream = futures::stream::unfold(updates, |mut updates| async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    let event = Event::default()
                        .event("transcript")
                        .json_data(&update)
                        .unwrap_or_else(|_| Event::default().comment("unserializable update"));
                    return Some((Ok(event), updates));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} update(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /transcription/save
/// Merge a transcript into a project's requirements
pub async fn save_transcription(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveTranscriptionRequest>,
) -> Response {
    match state.sessions.save_transcription(request).await {
        Ok(saved) => Json(SaveTranscriptionResponse {
            success: true,
            project_id: saved.project_id,
            updated_field: saved.updated_field,
        })
        .into_response(),
        Err(e) => {
            warn!("Failed to save transcription: {}", e);
            e.into_response()
        }
    }
}

// ============================================================================
// Assistant Handler
// ============================================================================

/// ANY /assistant
/// Only POST is accepted
pub async fn assistant(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return ProxyError::MethodNotAllowed.into_response();
    }

    let request: AssistantRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return ProxyError::Internal(e.to_string()).into_response(),
    };

    match state.assistant.handle(request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Project Handlers
// ============================================================================

/// GET /projects
pub async fn list_projects(State(state): State<AppState>) -> Response {
    match state.projects.list().await {
        Ok(projects) => Json(ProjectsResponse {
            success: true,
            projects,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /projects
pub async fn create_project(State(state): State<AppState>, JsonBody(req): JsonBody<CreateProjectRequest>) -> Response {
    if req.title.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Project title is required");
    }

    match state.projects.create(req.title.trim()).await {
        Ok(project) => (
            StatusCode::CREATED,
            Json(ProjectResponse {
                success: true,
                project,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /projects/:project_id
pub async fn get_project(State(state): State<AppState>, Path(project_id): Path<String>) -> Response {
    match state.projects.get(&project_id).await {
        Ok(project) => Json(ProjectDetailsResponse {
            success: true,
            project,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// PATCH /projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    JsonBody(update): JsonBody<ProjectUpdate>,
) -> Response {
    match state.projects.update(&project_id, &update).await {
        Ok(project) => Json(ProjectResponse {
            success: true,
            project,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /projects/:project_id
pub async fn delete_project(State(state): State<AppState>, Path(project_id): Path<String>) -> Response {
    match state.projects.delete(&project_id).await {
        Ok(()) => Json(SuccessResponse { success: true }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PUT /projects/:project_id/requirements
pub async fn save_requirements(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    JsonBody(fields): JsonBody<RequirementsUpdate>,
) -> Response {
    match state.projects.save_requirements(&project_id, &fields).await {
        Ok(requirements) => Json(RequirementsResponse {
            success: true,
            requirements,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /projects/:project_id/drafts
pub async fn save_draft(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    JsonBody(req): JsonBody<SaveDraftRequest>,
) -> Response {
    match state.projects.save_draft(&project_id, &req.content, req.user_edited).await {
        Ok(draft) => {
            info!("Draft v{} saved for project {}", draft.version, project_id);
            (StatusCode::CREATED, Json(DraftResponse { success: true, draft })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// PATCH /drafts/:draft_id
pub async fn update_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<String>,
    JsonBody(req): JsonBody<UpdateDraftRequest>,
) -> Response {
    match state.projects.update_draft(&draft_id, &req.content).await {
        Ok(draft) => Json(DraftResponse { success: true, draft }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
