// handlers/public/system.rs - service info, health and log probe

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Device Lending API",
            "version": version,
            "environment": format!("{:?}", state.config.environment),
            "storage": format!("{:?}", state.config.database.storage),
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/api/auth/login (public - token acquisition)",
                "employee": "/api/v1/employee/* (protected)",
                "device": "/api/v1/device/* (protected)",
                "borrowing": "/api/v1/borrowing/* (protected)",
                "logs": "/api/v1/logs/getAll (protected, admin)",
            }
        }
    }))
}

/// GET /health - storage ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.services.health.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}

/// GET /log - writes one line at every level so the filter can be checked
pub async fn log() -> &'static str {
    tracing::trace!("Log level: TRACE");
    tracing::debug!("Log level: DEBUG");
    tracing::info!("Log level: INFO");
    tracing::warn!("Log level: WARN");
    tracing::error!("Log level: ERROR");

    "Hey! You can check the output in the logs"
}
