use super::common::{created_response, success_response};
use crate::{auth::AuthenticatedUser, errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRequestsQuery {
    /// The group master's user id; listing is scoped to it
    pub master: Option<Uuid>,
}

/// Ask to join a group as the calling user
#[utoipa::path(
    post,
    path = "/groups/{group_id}/requests",
    params(("group_id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 201, description = "Request created", body = crate::services::group_requests::GroupRequestResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request already exists", body = crate::errors::ErrorResponse),
        (status = 422, description = "Already a member", body = crate::errors::ErrorResponse)
    ),
    tag = "group-requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .services
        .group_requests
        .request_join(group_id, current_user.user_id)
        .await?;

    Ok(created_response(json!({ "group_request": request })))
}

/// List a group's join requests for its master
#[utoipa::path(
    get,
    path = "/groups/{group_id}/requests",
    params(
        ("group_id" = Uuid, Path, description = "Group ID"),
        ListRequestsQuery
    ),
    responses(
        (status = 200, description = "Requests listed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Missing master parameter", body = crate::errors::ErrorResponse)
    ),
    tag = "group-requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .services
        .group_requests
        .list_for_master(group_id, query.master)
        .await?;

    Ok(success_response(json!({ "group_requests": requests })))
}

/// Accept a pending request, adding the requester to the roster
#[utoipa::path(
    post,
    path = "/groups/{group_id}/requests/{request_id}/accept",
    params(
        ("group_id" = Uuid, Path, description = "Group ID"),
        ("request_id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request accepted", body = crate::services::group_requests::GroupRequestResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Group or request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "group-requests"
)]
pub async fn accept_request(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Path((group_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .services
        .group_requests
        .accept(group_id, request_id)
        .await?;

    Ok(success_response(json!({ "group_request": request })))
}

/// Reject a pending request; the request is deleted
#[utoipa::path(
    delete,
    path = "/groups/{group_id}/requests/{request_id}",
    params(
        ("group_id" = Uuid, Path, description = "Group ID"),
        ("request_id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request rejected"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Group or request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "group-requests"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Path((group_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .group_requests
        .reject(group_id, request_id)
        .await?;

    Ok(success_response(json!({})))
}
