use super::models::{Draft, NewDraft, Project, ProjectUpdate, Requirements, RequirementsUpdate};
use super::{ProjectStore, StoreError, StoreResult};
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

const PROJECTS: &str = "speech_projects";
const REQUIREMENTS: &str = "speech_requirements";
const DRAFTS: &str = "speech_drafts";

/// Store backed by a PostgREST endpoint (e.g. a Supabase project)
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<Vec<T>> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("PostgREST error: {} - {}", status, body);
            return Err(StoreError::Backend(format!("{} - {}", status, body)));
        }

        Ok(response.json().await?)
    }

    async fn one<T: DeserializeOwned>(&self, request: RequestBuilder, table: &'static str, id: &str) -> StoreResult<T> {
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait::async_trait]
impl ProjectStore for PostgrestStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let request = self
            .request(Method::GET, PROJECTS)
            .query(&[("select", "*"), ("order", "updated_at.desc")]);
        self.rows(request).await
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let request = self
            .request(Method::GET, PROJECTS)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        Ok(self.rows(request).await?.into_iter().next())
    }

    async fn insert_project(&self, title: &str) -> StoreResult<Project> {
        debug!("Inserting project '{}'", title);
        let request = self
            .request(Method::POST, PROJECTS)
            .json(&json!([{ "title": title }]));
        self.one(request, PROJECTS, title).await
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> StoreResult<Project> {
        let mut body = serde_json::to_value(update)?;
        body["updated_at"] = json!(Utc::now());

        let request = self
            .request(Method::PATCH, PROJECTS)
            .query(&[("id", eq(id))])
            .json(&body);
        self.one(request, PROJECTS, id).await
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        let request = self.request(Method::DELETE, PROJECTS).query(&[("id", eq(id))]);
        let _: Vec<Project> = self.rows(request).await?;
        Ok(())
    }

    async fn get_requirements(&self, project_id: &str) -> StoreResult<Option<Requirements>> {
        let request = self
            .request(Method::GET, REQUIREMENTS)
            .query(&[("select", "*".to_string()), ("project_id", eq(project_id))]);
        Ok(self.rows(request).await?.into_iter().next())
    }

    async fn insert_requirements(&self, project_id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        let mut body = serde_json::to_value(fields)?;
        body["project_id"] = json!(project_id);

        let request = self.request(Method::POST, REQUIREMENTS).json(&json!([body]));
        self.one(request, REQUIREMENTS, project_id).await
    }

    async fn update_requirements(&self, id: &str, fields: &RequirementsUpdate) -> StoreResult<Requirements> {
        let request = self
            .request(Method::PATCH, REQUIREMENTS)
            .query(&[("id", eq(id))])
            .json(fields);
        self.one(request, REQUIREMENTS, id).await
    }

    async fn list_drafts(&self, project_id: &str) -> StoreResult<Vec<Draft>> {
        let request = self.request(Method::GET, DRAFTS).query(&[
            ("select", "*".to_string()),
            ("project_id", eq(project_id)),
            ("order", "version.desc".to_string()),
        ]);
        self.rows(request).await
    }

    async fn insert_draft(&self, draft: &NewDraft) -> StoreResult<Draft> {
        let request = self.request(Method::POST, DRAFTS).json(&[draft]);
        self.one(request, DRAFTS, &draft.project_id).await
    }

    async fn update_draft(&self, id: &str, content: &str) -> StoreResult<Draft> {
        let request = self
            .request(Method::PATCH, DRAFTS)
            .query(&[("id", eq(id))])
            .json(&json!({ "content": content, "user_edited": true }));
        self.one(request, DRAFTS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let store = PostgrestStore::new("https://example.supabase.co/", "anon");
        assert_eq!(store.base_url, "https://example.supabase.co");
    }

    #[test]
    fn test_request_targets_table_with_headers() {
        let store = PostgrestStore::new("https://example.supabase.co", "anon");
        let request = store
            .request(Method::GET, PROJECTS)
            .query(&[("id", eq("p1"))])
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://example.supabase.co/rest/v1/speech_projects?id=eq.p1"
        );
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["authorization"], "Bearer anon");
        assert_eq!(request.headers()["prefer"], "return=representation");
    }
}
