use crate::recognition::RecognitionSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable prefix, e.g. `TOASTMASTER__LLM__MODEL`
const ENV_PREFIX: &str = "TOASTMASTER";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    pub sessions: SessionsConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// Whether the speech capability is offered at all
    pub enabled: bool,
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Active sessions older than this are logged as stale; only completed sessions are reaped
    pub max_age_secs: i64,
    pub reap_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_version: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    /// Largest accepted message, in estimated tokens
    pub token_limit: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub briefing_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgrest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub api_key_env: String,
}

impl Config {
    /// Load defaults, then `path` (any format the config crate knows), then the environment
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "toastmaster")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8787_i64)?
            .set_default("recognition.enabled", true)?
            .set_default("recognition.lang", "en-US")?
            .set_default("recognition.continuous", true)?
            .set_default("recognition.interim_results", true)?
            .set_default("sessions.max_age_secs", 3600_i64)?
            .set_default("sessions.reap_interval_secs", 300_i64)?
            .set_default("llm.api_url", crate::assistant::client::DEFAULT_API_URL)?
            .set_default("llm.api_version", crate::assistant::client::DEFAULT_API_VERSION)?
            .set_default("llm.model", crate::assistant::proxy::DEFAULT_MODEL)?
            .set_default("llm.api_key_env", "CLAUDE_API_KEY")?
            .set_default("llm.max_tokens", 1000_i64)?
            .set_default("llm.token_limit", 100_000_i64)?
            .set_default("llm.max_attempts", 2_i64)?
            .set_default("llm.retry_delay_ms", 0_i64)?
            .set_default("llm.timeout_secs", 60_i64)?
            .set_default("llm.briefing_path", "config/briefing_ai_assistant.md")?
            .set_default("store.backend", "memory")?
            .set_default("store.url", "")?
            .set_default("store.api_key_env", "SUPABASE_ANON_KEY")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn recognition_settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            continuous: self.recognition.continuous,
            interim_results: self.recognition.interim_results,
            lang: self.recognition.lang.clone(),
        }
    }

    pub fn llm_api_key(&self) -> Option<String> {
        read_secret(&self.llm.api_key_env)
    }

    pub fn store_api_key(&self) -> Option<String> {
        read_secret(&self.store.api_key_env)
    }

    /// System briefing handed to the model on every request
    pub fn load_briefing(&self) -> Result<String> {
        std::fs::read_to_string(&self.llm.briefing_path)
            .with_context(|| format!("Failed to read briefing document {}", self.llm.briefing_path))
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.sessions.reap_interval_secs.max(1))
    }
}

fn read_secret(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
