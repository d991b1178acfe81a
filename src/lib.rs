//! Roleplay API Library
//!
//! Backend for tabletop roleplay session groups: player registration,
//! bearer-token sessions, group membership requests, and password recovery.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod migrator;
pub mod openapi;
pub mod services;

use auth::{AuthRouterExt, AuthService};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub auth_service: Arc<AuthService>,
    pub services: handlers::AppServices,
}

/// Builds the API router.
///
/// Registration, login, password recovery, health, and API docs are public;
/// everything else requires a bearer token.
pub fn api_routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    let public = Router::new()
        .route("/users", post(handlers::users::create_user))
        .route(
            "/sessions",
            post(handlers::sessions::login).delete(handlers::sessions::logout),
        )
        .route("/forgot-password", post(handlers::passwords::forgot_password))
        .route("/reset-password", post(handlers::passwords::reset_password))
        .route("/health", get(handlers::health::health_check));

    let protected = Router::new()
        .route("/users/:id", put(handlers::users::update_user))
        .route(
            "/groups",
            get(handlers::groups::list_groups).post(handlers::groups::create_group),
        )
        .route(
            "/groups/:group_id",
            axum::routing::patch(handlers::groups::update_group)
                .delete(handlers::groups::delete_group),
        )
        .route(
            "/groups/:group_id/players/:player_id",
            axum::routing::delete(handlers::groups::remove_player),
        )
        .route(
            "/groups/:group_id/requests",
            post(handlers::group_requests::create_request)
                .get(handlers::group_requests::list_requests),
        )
        .route(
            "/groups/:group_id/requests/:request_id/accept",
            post(handlers::group_requests::accept_request),
        )
        .route(
            "/groups/:group_id/requests/:request_id",
            axum::routing::delete(handlers::group_requests::reject_request),
        )
        .with_auth();

    // The auth middleware resolves its AuthService from request extensions.
    public.merge(protected).layer(axum::middleware::from_fn_with_state(
        auth_service,
        |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
         mut req: axum::http::Request<axum::body::Body>,
         next: axum::middleware::Next| async move {
            req.extensions_mut().insert(auth);
            next.run(req).await
        },
    ))
}
