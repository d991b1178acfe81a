use super::common::success_response;
use crate::{errors::ApiError, handlers::AppState};
use axum::{extract::State, response::IntoResponse};
use serde_json::json;

/// Liveness probe with a database reachability check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 500, description = "Database unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    crate::db::ping(&state.db).await?;

    Ok(success_response(json!({
        "status": "ok",
        "database": "reachable",
    })))
}
