use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::bootstrap::AppState;

pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checked_at": Utc::now().to_rfc3339(),
            })),
        ),
        Err(error) => {
            tracing::warn!(error = %error, "health check database probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "checked_at": Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}
