use super::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::groups::{CreateGroupRequest, GroupFilter, UpdateGroupRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

/// Listing filters: `user` narrows to groups the user plays in, `term`
/// matches name or description case-insensitively.
#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupListQuery {
    pub user: Option<Uuid>,
    pub term: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// List groups, optionally filtered by member and/or search term
#[utoipa::path(
    get,
    path = "/groups",
    params(GroupListQuery),
    responses(
        (status = 200, description = "Groups listed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Query(query): Query<GroupListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = GroupFilter {
        member_user_id: query.user,
        search_term: query.term,
    };

    let pagination = PaginationParams::default();
    let page = query.page.unwrap_or(pagination.page);
    let per_page = query.per_page.unwrap_or(pagination.per_page);

    let list = state
        .services
        .groups
        .list_groups(filter, page, per_page)
        .await?;

    let groups = PaginatedResponse::new(list.groups, list.page, list.per_page, list.total);

    Ok(success_response(json!({ "groups": groups })))
}

/// Create a group; the master is attached as its first player
#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = crate::services::groups::GroupResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Master user not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let group = state.services.groups.create_group(payload).await?;

    Ok(created_response(json!({ "group": group })))
}

/// Update a group's text fields; only the master may do this
#[utoipa::path(
    patch,
    path = "/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = crate::services::groups::GroupResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn update_group(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .groups
        .authorize_master(group_id, current_user.user_id)
        .await?;

    let group = state.services.groups.update_group(group_id, payload).await?;

    Ok(success_response(json!({ "group": group })))
}

/// Delete a group and its memberships; only the master may do this
#[utoipa::path(
    delete,
    path = "/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .groups
        .authorize_master(group_id, current_user.user_id)
        .await?;

    state.services.groups.delete_group(group_id).await?;

    Ok(success_response(json!({})))
}

/// Remove a player from a group's roster. The master cannot be removed.
#[utoipa::path(
    delete,
    path = "/groups/{group_id}/players/{player_id}",
    params(
        ("group_id" = Uuid, Path, description = "Group ID"),
        ("player_id" = Uuid, Path, description = "Player user ID")
    ),
    responses(
        (status = 200, description = "Player removed (or was not a member)"),
        (status = 400, description = "Cannot remove the master", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn remove_player(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Path((group_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .groups
        .remove_member(group_id, player_id)
        .await?;

    Ok(success_response(json!({})))
}
