use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roleplay API",
        version = "0.1.0",
        description = r#"
Backend for tabletop roleplay session groups.

Players register, log in with bearer tokens, create groups, ask to join
other groups, and recover forgotten passwords. Group masters review join
requests and manage their rosters.

## Authentication

Most endpoints require a bearer token obtained from `POST /sessions`:

```
Authorization: Bearer <token>
```

## Errors

Failures share one envelope, distinguished by the numeric status:

```json
{ "message": "group not found", "code": "BAD_REQUEST", "status": 404 }
```
"#
    ),
    paths(
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::sessions::login,
        crate::handlers::sessions::logout,
        crate::handlers::groups::list_groups,
        crate::handlers::groups::create_group,
        crate::handlers::groups::update_group,
        crate::handlers::groups::delete_group,
        crate::handlers::groups::remove_player,
        crate::handlers::group_requests::create_request,
        crate::handlers::group_requests::list_requests,
        crate::handlers::group_requests::accept_request,
        crate::handlers::group_requests::reject_request,
        crate::handlers::passwords::forgot_password,
        crate::handlers::passwords::reset_password,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,
            crate::services::users::UserResponse,
            crate::services::groups::CreateGroupRequest,
            crate::services::groups::UpdateGroupRequest,
            crate::services::groups::GroupResponse,
            crate::services::group_requests::GroupRequestResponse,
            crate::services::group_requests::GroupRequestListItem,
            crate::services::group_requests::GroupSummary,
            crate::services::password_reset::ForgotPasswordRequest,
            crate::services::password_reset::ResetPasswordRequest,
            crate::handlers::sessions::LoginRequest,
            crate::auth::AccessToken,
            crate::entities::group_request::RequestStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
