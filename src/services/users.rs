use crate::{
    auth::PasswordService,
    db::DbPool,
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the user service

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(url(message = "avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            avatar: model.avatar,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Service for player account registration and profile updates
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Registers a new account. Email and username must both be free; the
    /// application-level checks give friendly messages and the unique
    /// indexes close the race window behind them.
    #[instrument(skip(self, request), fields(email = %request.email, username = %request.username))]
    pub async fn register(&self, request: CreateUserRequest) -> Result<UserResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let email_taken = UserEntity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(db)
            .await?
            .is_some();
        if email_taken {
            return Err(ServiceError::Conflict("email already in use".to_string()));
        }

        let username_taken = UserEntity::find()
            .filter(user::Column::Username.eq(request.username.clone()))
            .one(db)
            .await?
            .is_some();
        if username_taken {
            return Err(ServiceError::Conflict("username already in use".to_string()));
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let active_model = UserActiveModel {
            id: Set(user_id),
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            avatar: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(db).await.map_err(|e| {
            match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    ServiceError::Conflict("email or username already in use".to_string())
                }
                _ => ServiceError::DatabaseError(e),
            }
        })?;

        info!(user_id = %user_id, "User registered");

        Ok(model.into())
    }

    /// Updates a user's email, password, and optionally avatar
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let user = UserEntity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;

        let email_taken_by_other = UserEntity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .filter(user::Column::Id.ne(user_id))
            .one(db)
            .await?
            .is_some();
        if email_taken_by_other {
            return Err(ServiceError::Conflict("email already in use".to_string()));
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let mut active_model: UserActiveModel = user.into();
        active_model.email = Set(request.email);
        active_model.password_hash = Set(password_hash);
        if let Some(avatar) = request.avatar {
            active_model.avatar = Set(Some(avatar));
        }
        active_model.updated_at = Set(Utc::now());

        let updated = active_model.update(db).await?;

        info!(user_id = %user_id, "User profile updated");

        Ok(updated.into())
    }

    /// Fetches a user by id
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_to_response_conversion() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let model = UserModel {
            id: user_id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            avatar: Some("https://example.com/alice.png".to_string()),
            created_at: now,
            updated_at: now,
        };

        let response: UserResponse = model.into();
        assert_eq!(response.id, user_id);
        assert_eq!(response.username, "alice");
        assert_eq!(response.email, "alice@example.com");
        assert_eq!(
            response.avatar.as_deref(),
            Some("https://example.com/alice.png")
        );
    }

    #[test]
    fn create_request_validation() {
        let valid = CreateUserRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "12345678".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "alice@".to_string(),
            username: "alice".to_string(),
            password: "12345678".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateUserRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "1234".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn update_request_rejects_invalid_avatar() {
        let request = UpdateUserRequest {
            email: "alice@example.com".to_string(),
            password: "12345678".to_string(),
            avatar: Some("not-a-url".to_string()),
        };
        assert!(request.validate().is_err());
    }
}
