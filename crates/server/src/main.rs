use clubhouse_server::{build_router, storage, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clubhouse_server=info,tower_http=info".into()),
        )
        .init();

    let config = clubhouse_runtime_config::load(|key| std::env::var(key).ok())?;

    tracing::info!("data directory: {}", config.server.data_dir.display());

    // Initialize database
    let db = storage::init_db(&config.server.data_dir)?;
    tracing::info!("database initialized");

    if config.auth.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET not set; every request will be treated as anonymous");
    }
    if config.auth.provider_url.is_empty() {
        tracing::warn!("AUTH_PROVIDER_URL not set; session refresh is disabled");
    }
    if !config.notifications.enabled() {
        tracing::info!("message notifications disabled (no webhook configured)");
    }

    let base_url = config.server.effective_base_url();
    let port = config.server.port;
    let state = AppState::new(db, config)?;
    let app = build_router(state);

    tracing::info!("starting server at {base_url}");

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
