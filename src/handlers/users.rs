use super::common::{created_response, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    errors::{ApiError, ServiceError},
    handlers::AppState,
    services::users::{CreateUserRequest, UpdateUserRequest},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

/// Register a new player account
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = crate::services::users::UserResponse),
        (status = 409, description = "Email or username already in use", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let user = state.services.users.register(payload).await?;

    Ok(created_response(json!({ "user": user })))
}

/// Update the caller's email, password, and avatar
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = crate::services::users::UserResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    // Profile updates are self-service only.
    if current_user.user_id != user_id {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "you can only update your own profile".to_string(),
        )));
    }

    let user = state
        .services
        .users
        .update_profile(user_id, payload)
        .await?;

    Ok(success_response(json!({ "user": user })))
}
