use super::models::{Draft, NewDraft, Project, ProjectDetails, ProjectUpdate, Requirements, RequirementsUpdate};
use super::{ProjectStore, StoreError, StoreResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Project operations composed from the store primitives
#[derive(Clone)]
pub struct Projects {
    store: Arc<dyn ProjectStore>,

    /// Held across read-then-write sequences (requirements upsert, draft versioning)
    write_lock: Arc<Mutex<()>>,
}

impl Projects {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn ensure_project(&self, project_id: &str) -> StoreResult<Project> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table: "speech_projects",
                id: project_id.to_string(),
            })
    }

    pub async fn list(&self) -> StoreResult<Vec<Project>> {
        self.store.list_projects().await
    }

    /// Project plus its requirements (if any) and drafts
    pub async fn get(&self, project_id: &str) -> StoreResult<ProjectDetails> {
        let project = self.ensure_project(project_id).await?;
        let requirements = self.store.get_requirements(project_id).await?;
        let drafts = self.store.list_drafts(project_id).await?;

        Ok(ProjectDetails {
            project,
            requirements,
            drafts,
        })
    }

    pub async fn create(&self, title: &str) -> StoreResult<Project> {
        let project = self.store.insert_project(title).await?;
        info!("Created project {} ({})", project.id, project.title);
        Ok(project)
    }

    pub async fn update(&self, project_id: &str, update: &ProjectUpdate) -> StoreResult<Project> {
        self.store.update_project(project_id, update).await
    }

    pub async fn delete(&self, project_id: &str) -> StoreResult<()> {
        self.store.delete_project(project_id).await?;
        info!("Deleted project {}", project_id);
        Ok(())
    }

    /// Update the project's requirements, creating the row if needed
    pub async fn save_requirements(&self, project_id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        let _guard = self.write_lock.lock().await;
        self.ensure_project(project_id).await?;

        match self.store.get_requirements(project_id).await? {
            Some(existing) => self.store.update_requirements(&existing.id, fields).await,
            None => self.store.insert_requirements(project_id, fields).await,
        }
    }

    /// Store a new draft one version above the latest
    pub async fn save_draft(&self, project_id: &str, content: &str, user_edited: bool) -> StoreResult<Draft> {
        let _guard = self.write_lock.lock().await;
        self.ensure_project(project_id).await?;

        let latest = self
            .store
            .list_drafts(project_id)
            .await?
            .iter()
            .map(|d| d.version)
            .max()
            .unwrap_or(0);

        let draft = self
            .store
            .insert_draft(&NewDraft {
                project_id: project_id.to_string(),
                content: content.to_string(),
                version: latest + 1,
                user_edited,
            })
            .await?;

        self.store
            .update_project(project_id, &ProjectUpdate::default())
            .await?;

        info!("Saved draft v{} for project {}", draft.version, project_id);
        Ok(draft)
    }

    /// Replace a draft's content; the draft becomes user-edited
    pub async fn update_draft(&self, draft_id: &str, content: &str) -> StoreResult<Draft> {
        let draft = self.store.update_draft(draft_id, content).await?;
        self.store
            .update_project(&draft.project_id, &ProjectUpdate::default())
            .await?;
        Ok(draft)
    }
}
