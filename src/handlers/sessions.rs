use super::common::{created_response, success_response, validate_input};
use crate::{
    auth::bearer_token,
    errors::{ApiError, ServiceError},
    handlers::AppState,
    services::users::UserResponse,
};
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Log in with email and password; returns the user and a bearer token
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Session created", body = crate::auth::AccessToken),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let (user, token) = state
        .auth_service
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(created_response(json!({
        "user": UserResponse::from(user),
        "token": token,
    })))
}

/// Log out by revoking the presented bearer token
#[utoipa::path(
    delete,
    path = "/sessions",
    responses(
        (status = 200, description = "Session destroyed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ApiError::ServiceError(ServiceError::Unauthorized(
            "missing authorization token".to_string(),
        ))
    })?;

    state
        .auth_service
        .revoke_token(token)
        .await
        .map_err(|e| ApiError::ServiceError(ServiceError::Unauthorized(e.to_string())))?;

    Ok(success_response(json!({})))
}
