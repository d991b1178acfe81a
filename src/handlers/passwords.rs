use super::common::{no_content_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::password_reset::{ForgotPasswordRequest, ResetPasswordRequest},
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};

/// Request a password recovery mail
#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 204, description = "Recovery mail dispatched"),
        (status = 404, description = "Unknown email", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "passwords"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state.services.password_reset.forgot_password(payload).await?;

    Ok(no_content_response())
}

/// Consume a reset token and set a new password
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 404, description = "Unknown or consumed token", body = crate::errors::ErrorResponse),
        (status = 410, description = "Token expired", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "passwords"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state.services.password_reset.reset_password(payload).await?;

    Ok(no_content_response())
}
