use crate::assistant::{AnthropicClient, AssistantProxy, RetryPolicy};
use crate::config::{Config, StoreBackend};
use crate::recognition::{EngineFeed, FeedEngine, RecognitionAdapter};
use crate::session::SessionManager;
use crate::storage::{MemoryStore, PostgrestStore, ProjectStore, Projects};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Transcription session manager (sole owner of the recognition engine)
    pub sessions: Arc<SessionManager>,

    /// Entry point for recognition events forwarded by the browser
    pub feed: EngineFeed,

    /// Assistant proxy to the upstream model
    pub assistant: Arc<AssistantProxy>,

    /// Project, requirements and draft operations
    pub projects: Projects,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, feed: EngineFeed, assistant: Arc<AssistantProxy>, projects: Projects) -> Self {
        Self {
            sessions,
            feed,
            assistant,
            projects,
        }
    }

    /// Wire every component from configuration
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let store: Arc<dyn ProjectStore> = match cfg.store.backend {
            StoreBackend::Memory => {
                info!("Using in-memory project store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Postgrest => {
                if cfg.store.url.is_empty() {
                    bail!("store.url is required for the postgrest backend");
                }
                let api_key = cfg
                    .store_api_key()
                    .with_context(|| format!("{} is not set", cfg.store.api_key_env))?;
                info!("Using PostgREST project store at {}", cfg.store.url);
                Arc::new(PostgrestStore::new(&cfg.store.url, api_key))
            }
        };

        let engine = if cfg.recognition.enabled {
            FeedEngine::new()
        } else {
            warn!("Speech recognition disabled by configuration");
            FeedEngine::unsupported()
        };
        let feed = engine.feed();

        let sessions = SessionManager::new(RecognitionAdapter::new(Box::new(engine)), Arc::clone(&store))
            .with_defaults(cfg.recognition_settings())
            .with_max_session_age(chrono::Duration::seconds(cfg.sessions.max_age_secs));

        let api_key = cfg.llm_api_key();
        if api_key.is_none() {
            warn!("{} is not set; assistant requests will be rejected upstream", cfg.llm.api_key_env);
        }

        let client = AnthropicClient::new(api_key, cfg.llm_timeout())?
            .with_api_url(&cfg.llm.api_url)
            .with_api_version(&cfg.llm.api_version);

        let retry = RetryPolicy::transient()
            .with_max_attempts(cfg.llm.max_attempts)
            .with_delay(Duration::from_millis(cfg.llm.retry_delay_ms));

        let assistant = AssistantProxy::new(Arc::new(client), cfg.load_briefing()?)
            .with_model(&cfg.llm.model)
            .with_max_tokens(cfg.llm.max_tokens)
            .with_token_limit(cfg.llm.token_limit)
            .with_retry(retry);

        Ok(Self::new(
            Arc::new(sessions),
            feed,
            Arc::new(assistant),
            Projects::new(store),
        ))
    }
}
