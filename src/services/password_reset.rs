use crate::{
    auth::PasswordService,
    db::DbPool,
    entities::password_reset_token::{
        self, ActiveModel as ResetTokenActiveModel, Entity as ResetTokenEntity,
    },
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity},
    errors::ServiceError,
    mailer::{forgot_password_message, Mailer},
};
use chrono::{Duration, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A reset token is usable for two hours after issuance.
const TOKEN_EXPIRATION_HOURS: i64 = 2;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "reset_password_url is required"))]
    pub reset_password_url: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

/// Service implementing the password recovery flow: token issuance with
/// replace-on-request semantics, and single-use consumption.
#[derive(Clone)]
pub struct PasswordResetService {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
    mail_from: String,
}

impl PasswordResetService {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, mail_from: String) -> Self {
        Self {
            db,
            mailer,
            mail_from,
        }
    }

    /// Issues a fresh reset token for the account behind `email`, replacing
    /// any token the user already holds, and dispatches the recovery mail.
    ///
    /// Mail delivery is fire-and-forget: a send failure is logged and does
    /// not undo the token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let user = UserEntity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;

        let token = Uuid::new_v4().to_string();

        // Upsert keyed on user_id: the unique index makes the replacement a
        // single atomic statement rather than a delete-then-insert pair.
        ResetTokenEntity::insert(ResetTokenActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            token: Set(token.clone()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(password_reset_token::Column::UserId)
                .update_columns([
                    password_reset_token::Column::Token,
                    password_reset_token::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

        info!(user_id = %user.id, "Password reset token issued");

        let reset_link = format!("{}?token={}", request.reset_password_url, token);
        let message =
            forgot_password_message(&self.mail_from, &user.email, &user.username, &reset_link);

        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(message).await {
                warn!(error = %e, "Failed to deliver password recovery mail");
            }
        });

        Ok(())
    }

    /// Consumes a reset token and sets the user's new password.
    ///
    /// Lookup, expiry check, password mutation, and token deletion run in a
    /// single transaction; of two concurrent consumers of the same token
    /// only one can observe a deleted row count of one, the other fails
    /// with NotFound.
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for password reset");
            ServiceError::DatabaseError(e)
        })?;

        let token_row = ResetTokenEntity::find()
            .filter(password_reset_token::Column::Token.eq(request.token.clone()))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("token".to_string()))?;

        let token_age = Utc::now().signed_duration_since(token_row.created_at);
        if token_age > Duration::hours(TOKEN_EXPIRATION_HOURS) {
            return Err(ServiceError::TokenExpired);
        }

        let user = UserEntity::find_by_id(token_row.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
        let user_id = user.id;

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let mut active_model: UserActiveModel = user.into();
        active_model.password_hash = Set(password_hash);
        active_model.updated_at = Set(Utc::now());
        active_model.update(&txn).await?;

        let deleted = ResetTokenEntity::delete_many()
            .filter(password_reset_token::Column::Id.eq(token_row.id))
            .exec(&txn)
            .await?;
        if deleted.rows_affected == 0 {
            // A concurrent reset consumed the token first.
            return Err(ServiceError::NotFound("token".to_string()));
        }

        txn.commit().await?;

        info!(user_id = %user_id, "Password reset completed");

        Ok(())
    }
}
