use axum::{Json, extract::State};
use redb::ReadableDatabase;
use serde_json::{Value, json};

use crate::AppState;

/// Health check endpoint
///
/// Reports server status and whether the database accepts read transactions.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || match db.begin_read() {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    })
    .await
    .unwrap_or("error");

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "timestamp": state.clock.now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
