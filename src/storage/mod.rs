//! Project storage
//!
//! The relational store is an external collaborator. This module defines
//! the narrow interface the service needs, an in-memory backend and a
//! PostgREST backend, plus the project operations built on top of them.

mod memory;
mod models;
mod postgrest;
mod projects;

pub use memory::MemoryStore;
pub use models::{Draft, NewDraft, Project, ProjectDetails, ProjectUpdate, Requirements, RequirementsUpdate};
pub use postgrest::PostgrestStore;
pub use projects::Projects;

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: String },

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned malformed data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Operations over `speech_projects`, `speech_requirements` and `speech_drafts`
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, most recently updated first
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;

    async fn insert_project(&self, title: &str) -> StoreResult<Project>;

    /// Apply `update` and refresh `updated_at`
    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> StoreResult<Project>;

    async fn delete_project(&self, id: &str) -> StoreResult<()>;

    async fn get_requirements(&self, project_id: &str) -> StoreResult<Option<Requirements>>;

    async fn insert_requirements(&self, project_id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements>;

    /// Update the requirements row with the given `id`
    async fn update_requirements(&self, id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements>;

    /// Drafts of a project, highest version first
    async fn list_drafts(&self, project_id: &str) -> StoreResult<Vec<Draft>>;

    async fn insert_draft(&self, draft: &NewDraft) -> StoreResult<Draft>;

    /// Replace draft content and mark it as edited by the user
    async fn update_draft(&self, id: &str, content: &str) -> StoreResult<Draft>;
}
