/*!
 * # Authentication Module
 *
 * Bearer-token session handling for the API: Argon2id password
 * verification, HS256 token issuance with a two-hour lifetime, token
 * validation, and logout via an in-memory revocation list.
 */

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

mod password;

pub use password::PasswordService;

use crate::{
    db::DbPool,
    entities::user::{self, Entity as UserEntity, Model as UserModel},
    errors::ServiceError,
};

/// Claim structure for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (user ID)
    pub username: String, // User's display name
    pub email: String,    // User's email
    pub jti: String,      // Token ID (unique identifier for this token)
    pub iat: i64,         // Issued at time
    pub exp: i64,         // Expiration time
    pub nbf: i64,         // Not valid before time
    pub iss: String,      // Issuer
    pub aud: String,      // Audience
}

/// Authenticated user data extracted from the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token_id: String,
}

/// Type alias used by handler signatures
pub type AuthenticatedUser = AuthUser;

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_expiration,
        }
    }
}

impl From<&crate::config::AppConfig> for AuthConfig {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
        }
    }
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization token")]
    MissingAuth,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    TokenExpired,
    #[error("token has been revoked")]
    RevokedToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to create token: {0}")]
    TokenCreation(String),
    #[error("internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::TokenCreation(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::TokenCreation(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(serde_json::json!({
            "message": message,
            "code": "BAD_REQUEST",
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Token revocation entry
#[derive(Clone, Debug)]
struct RevokedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

/// Authentication service that handles credential checks and token lifecycle
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DbPool>,
    revoked_tokens: Arc<RwLock<Vec<RevokedToken>>>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self {
            config,
            db,
            revoked_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Verify a user's credentials and issue a session token
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserModel, AccessToken), ServiceError> {
        let user = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        let valid = PasswordService::verify_password(password, &user.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !valid {
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        let token = self
            .generate_token(&user)
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;

        Ok((user, token))
    }

    /// Generate a session token for a user
    pub fn generate_token(&self, user: &UserModel) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::TokenCreation("invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(AccessToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs() as i64,
        })
    }

    /// Validate a session token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Revoke a token so subsequent requests carrying it fail
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;

        let expiry = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        let revoked = RevokedToken {
            jti: claims.jti,
            expiry,
        };

        let mut revoked_tokens = self.revoked_tokens.write().await;
        revoked_tokens.push(revoked);

        // Drop entries whose tokens have expired anyway.
        let now = Utc::now();
        revoked_tokens.retain(|t| t.expiry > now);

        debug!("Token revoked; revocation list size: {}", revoked_tokens.len());
        Ok(())
    }

    async fn is_token_revoked(&self, token_id: &str) -> bool {
        let revoked_tokens = self.revoked_tokens.read().await;
        revoked_tokens.iter().any(|t| t.jti == token_id)
    }
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service).await {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token).await?;

                let user_id =
                    Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

                return Ok(AuthUser {
                    user_id,
                    username: claims.username,
                    email: claims.email,
                    token_id: claims.jti,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Pull the raw bearer token out of a request's headers, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer "))
        .map(|v| v.trim_start_matches("Bearer ").trim())
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "a_test_secret_that_is_long_enough_for_tests".to_string(),
            "roleplay-api".to_string(),
            "roleplay-clients".to_string(),
            Duration::from_secs(7200),
        );
        AuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    fn test_user() -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip() {
        let service = test_service();
        let user = test_user();

        let issued = service.generate_token(&user).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 7200);

        let claims = service.validate_token(&issued.token).await.unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = test_service();
        let user = test_user();

        let issued = service.generate_token(&user).unwrap();
        service.revoke_token(&issued.token).await.unwrap();

        let err = service.validate_token(&issued.token).await.unwrap_err();
        assert!(matches!(err, AuthError::RevokedToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let service = test_service();
        let user = test_user();

        let past = Utc::now() - ChronoDuration::hours(4);
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: past.timestamp(),
            exp: (past + ChronoDuration::hours(2)).timestamp(),
            nbf: past.timestamp(),
            iss: service.config.jwt_issuer.clone(),
            aud: service.config.jwt_audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(service.config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = service.validate_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let service = test_service();
        let user = test_user();

        let issued = service.generate_token(&user).unwrap();
        let mut tampered = issued.token.clone();
        tampered.pop();

        let err = service.validate_token(&tampered).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
