use super::models::{Draft, NewDraft, Project, ProjectUpdate, Requirements, RequirementsUpdate};
use super::{ProjectStore, StoreError, StoreResult};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    projects: HashMap<String, Project>,
    requirements: HashMap<String, Requirements>,
    drafts: HashMap<String, Draft>,
}

/// Process-local store, used when no database is configured
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// Child rows must reference an existing project
    fn require_project(&self, project_id: &str) -> StoreResult<()> {
        if self.projects.contains_key(project_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                table: "speech_projects",
                id: project_id.to_string(),
            })
        }
    }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables.projects.values().cloned().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(id).cloned())
    }

    async fn insert_project(&self, title: &str) -> StoreResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .projects
            .insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(id).ok_or_else(|| StoreError::NotFound {
            table: "speech_projects",
            id: id.to_string(),
        })?;

        if let Some(title) = &update.title {
            project.title = title.clone();
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.projects.remove(id);
        tables.requirements.retain(|_, r| r.project_id != id);
        tables.drafts.retain(|_, d| d.project_id != id);
        Ok(())
    }

    async fn get_requirements(&self, project_id: &str) -> StoreResult<Option<Requirements>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requirements
            .values()
            .find(|r| r.project_id == project_id)
            .cloned())
    }

    async fn insert_requirements(&self, project_id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        let mut tables = self.tables.write().await;
        tables.require_project(project_id)?;
        if tables.requirements.values().any(|r| r.project_id == project_id) {
            return Err(StoreError::Backend(format!(
                "requirements already exist for project {}",
                project_id
            )));
        }

        let mut requirements = Requirements::empty(Uuid::new_v4().to_string(), project_id.to_string());
        requirements.apply(fields);
        tables
            .requirements
            .insert(requirements.id.clone(), requirements.clone());
        Ok(requirements)
    }

    async fn update_requirements(&self, id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        let mut tables = self.tables.write().await;
        let requirements = tables.requirements.get_mut(id).ok_or_else(|| StoreError::NotFound {
            table: "speech_requirements",
            id: id.to_string(),
        })?;
        requirements.apply(fields);
        Ok(requirements.clone())
    }

    async fn list_drafts(&self, project_id: &str) -> StoreResult<Vec<Draft>> {
        let tables = self.tables.read().await;
        let mut drafts: Vec<Draft> = tables
            .drafts
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(drafts)
    }

    async fn insert_draft(&self, draft: &NewDraft) -> StoreResult<Draft> {
        let mut tables = self.tables.write().await;
        tables.require_project(&draft.project_id)?;

        let draft = Draft {
            id: Uuid::new_v4().to_string(),
            project_id: draft.project_id.clone(),
            content: draft.content.clone(),
            version: draft.version,
            user_edited: draft.user_edited,
            created_at: Utc::now(),
        };
        tables.drafts.insert(draft.id.clone(), draft.clone());
        Ok(draft)
    }

    async fn update_draft(&self, id: &str, content: &str) -> StoreResult<Draft> {
        let mut tables = self.tables.write().await;
        let draft = tables.drafts.get_mut(id).ok_or_else(|| StoreError::NotFound {
            table: "speech_drafts",
            id: id.to_string(),
        })?;
        draft.content = content.to_string();
        draft.user_edited = true;
        Ok(draft.clone())
    }
}
