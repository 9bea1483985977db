use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_server::{AppState, Config, clock::SystemClock, open_database, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaderboard_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Leaderboard Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let offset = config.tz_offset().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}, UTC offset: {}",
        config.environment,
        config.server_address(),
        offset
    );

    // Open embedded database
    tracing::info!("Opening database at {}", config.database_path);
    let db = open_database(&config.database_path)?;
    tracing::info!("Database ready");

    // Configure CORS
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin: {}", origin);
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let log_requests = config.log_requests;
    let addr: SocketAddr = config.server_address().parse()?;

    let state = AppState::new(db, config, Arc::new(SystemClock::new(offset)));
    state.bootstrap_admin().await?;

    let mut app = router(state).layer(cors);
    if log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
