/// Health check and ping endpoints
///
/// # Endpoints
///
/// ```text
/// GET /health
/// GET /v1/ping
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use amari_shared::db::pool;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Returns service health including database connectivity
///
/// An unreachable database degrades the status but still answers 200.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match pool::health_check(&state.db).await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub ok: bool,
    pub time: DateTime<Utc>,
    pub env: PingEnvironment,
}

/// Which parts of the configuration are present, never their values
#[derive(Debug, Serialize, Deserialize)]
pub struct PingEnvironment {
    pub has_database_url: bool,
    pub has_concierge_key: bool,
    pub environment: String,
}

/// Liveness probe that never touches the database
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        time: Utc::now(),
        env: PingEnvironment {
            has_database_url: !state.config.database.url.is_empty(),
            has_concierge_key: state.concierge.is_some(),
            environment: state.config.environment.as_str().to_string(),
        },
    })
}
