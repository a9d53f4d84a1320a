use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use toastmaster::{create_router, AppState, Config, SessionManager};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "toastmaster", about = "Wedding speech assistant service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/toastmaster")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loaded config: {}", cfg.service.name);

    let state = AppState::from_config(&cfg)?;
    spawn_reaper(Arc::clone(&state.sessions), cfg.reap_interval());

    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn spawn_reaper(sessions: Arc<SessionManager>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            sessions.reap_stale_sessions().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
