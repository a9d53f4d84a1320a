use anyhow::Result;
use std::io::Write;
use toastmaster::config::StoreBackend;
use toastmaster::{AppState, Config};

fn write_config(contents: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_defaults_without_config_file() -> Result<()> {
    let cfg = Config::load("does/not/exist/toastmaster")?;

    assert_eq!(cfg.service.http.port, 8787);
    assert!(cfg.recognition.enabled);
    assert_eq!(cfg.recognition.lang, "en-US");
    assert_eq!(cfg.llm.model, "claude-3-7-sonnet-20250219");
    assert_eq!(cfg.llm.max_tokens, 1000);
    assert_eq!(cfg.llm.token_limit, 100_000);
    assert_eq!(cfg.llm.max_attempts, 2);
    assert_eq!(cfg.llm.api_key_env, "CLAUDE_API_KEY");
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> Result<()> {
    let file = write_config(
        r#"
[service.http]
port = 9100

[recognition]
lang = "en-GB"
interim_results = false

[llm]
token_limit = 500
"#,
    )?;

    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"))?;

    assert_eq!(cfg.service.http.port, 9100);
    assert_eq!(cfg.service.http.bind, "127.0.0.1", "Unset keys keep their defaults");
    let settings = cfg.recognition_settings();
    assert_eq!(settings.lang, "en-GB");
    assert!(!settings.interim_results);
    assert!(settings.continuous);
    assert_eq!(cfg.llm.token_limit, 500);
    Ok(())
}

#[test]
fn test_environment_overrides_file() -> Result<()> {
    // Nothing else here reads llm.retry_delay_ms
    let file = write_config("[llm]\nretry_delay_ms = 30\n")?;
    std::env::set_var("TOASTMASTER__LLM__RETRY_DELAY_MS", "45");

    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"));
    std::env::remove_var("TOASTMASTER__LLM__RETRY_DELAY_MS");

    assert_eq!(cfg?.llm.retry_delay_ms, 45);
    Ok(())
}

#[test]
fn test_reap_interval_never_zero() -> Result<()> {
    let file = write_config("[sessions]\nreap_interval_secs = 0\n")?;

    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"))?;

    assert_eq!(cfg.reap_interval(), std::time::Duration::from_secs(1));
    Ok(())
}

#[tokio::test]
async fn test_app_state_from_config() -> Result<()> {
    let mut briefing = tempfile::NamedTempFile::new()?;
    briefing.write_all(b"You help with wedding speeches.")?;
    let file = write_config(&format!(
        "[llm]\nbriefing_path = {:?}\napi_key_env = \"TOASTMASTER_TEST_UNSET_KEY\"\n",
        briefing.path().to_str().expect("utf-8 temp path")
    ))?;
    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"))?;

    let state = AppState::from_config(&cfg)?;

    assert!(state.sessions.check_support().await.supported);
    assert!(!state.feed.is_live());
    Ok(())
}

#[test]
fn test_missing_briefing_is_an_error() -> Result<()> {
    let file = write_config("[llm]\nbriefing_path = \"does/not/exist.md\"\n")?;
    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"))?;

    assert!(AppState::from_config(&cfg).is_err());
    Ok(())
}

#[test]
fn test_postgrest_requires_url() -> Result<()> {
    let file = write_config("[store]\nbackend = \"postgrest\"\n")?;
    let cfg = Config::load(file.path().to_str().expect("utf-8 temp path"))?;

    assert!(AppState::from_config(&cfg).is_err());
    Ok(())
}
