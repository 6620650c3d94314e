use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use khateraty::auth::{self, AuthState, LogMailer};
use khateraty::config::{Cli, Config};
use khateraty::db::{self, Repository};
use khateraty::routes;
use khateraty::state::AppState;

const MAINTENANCE_EVERY: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    std::fs::create_dir_all(config.storage_path())?;

    // Initialize database
    let pool = db::open(&config.db_path())?;

    let state = AppState::new(config.clone(), pool, Arc::new(LogMailer));
    auth::spawn_listener(state.auth.subscribe(), state.auth_state.clone());

    // Counters are maintained per write; this repairs anything that drifted
    let repo = state.repo.clone();
    let auth_state = state.auth_state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_EVERY);
        loop {
            ticker.tick().await;
            reconcile(repo.as_ref()).await;
            report_auth_activity(&auth_state).await;
        }
    });

    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn reconcile(repo: &dyn Repository) {
    match repo.reconcile_counters().await {
        Ok(0) => tracing::debug!("Post counters consistent"),
        Ok(fixed) => tracing::warn!(fixed, "Repaired drifted post counters"),
        Err(e) => tracing::error!("Counter reconciliation failed: {}", e),
    }
}

async fn report_auth_activity(auth_state: &RwLock<AuthState>) {
    let seen = auth_state.write().await.take();
    tracing::info!(
        sign_ins = seen.sign_ins,
        sign_outs = seen.sign_outs,
        refreshes = seen.refreshes,
        recoveries = seen.recoveries,
        updates = seen.updates,
        "Auth activity since last report"
    );
}
