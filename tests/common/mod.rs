use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use roleplay_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    handlers::AppServices,
    mailer::{MailMessage, Mailer, MailerError},
    AppState,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Mailer double that records every message instead of delivering it.
#[derive(Default, Clone)]
pub struct RecordingMailer {
    messages: Arc<Mutex<Vec<MailMessage>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailerError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: RecordingMailer,
}

/// A registered user with a live session token.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub token: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only".to_string(),
            7200,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        // In-memory SQLite gives each pooled connection its own database;
        // pin the pool to a single shared connection.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg), db_arc.clone()));

        let mailer = RecordingMailer::default();
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(mailer.clone()),
            cfg.mail_from.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            auth_service: auth_service.clone(),
            services,
        };

        let router = roleplay_api::api_routes(auth_service).with_state(state.clone());

        Self {
            router,
            state,
            mailer,
        }
    }

    /// Drive a single request through the router.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .expect("request build"),
            None => builder.body(Body::empty()).expect("request build"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should produce a response")
    }

    /// Register a user through the public endpoint.
    pub async fn register_user(&self, email: &str, username: &str, password: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/users",
                Some(json!({
                    "email": email,
                    "username": username,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    /// Log a user in and return the issued bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/sessions",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body["token"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Register and log in, returning the user's id and session token.
    pub async fn create_user_and_login(&self, email: &str, username: &str) -> TestUser {
        let password = "12345678";
        let body = self.register_user(email, username, password).await;
        let id = body["user"]["id"]
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .expect("user id in registration response");
        let token = self.login(email, password).await;

        TestUser {
            id,
            email: email.to_string(),
            username: username.to_string(),
            token,
        }
    }

    /// Create a group owned by `master` and return its id.
    pub async fn create_group(&self, master: &TestUser, name: &str) -> Uuid {
        let response = self
            .request(
                Method::POST,
                "/groups",
                Some(json!({
                    "name": name,
                    "description": "test",
                    "schedule": "test",
                    "location": "test",
                    "chronic": "test",
                    "master": master.id,
                })),
                Some(&master.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body["group"]["id"]
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .expect("group id in creation response")
    }
}

/// Decode a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
