//! Integration tests for the password recovery flow: token issuance with
//! replace-on-request semantics, expiry, and single-use consumption.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use roleplay_api::entities::password_reset_token;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

async fn stored_token(app: &TestApp, user_id: Uuid) -> Option<password_reset_token::Model> {
    password_reset_token::Entity::find()
        .filter(password_reset_token::Column::UserId.eq(user_id))
        .one(&*app.state.db)
        .await
        .unwrap()
}

/// The recovery mail is dispatched on a spawned task; let it run.
async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

#[tokio::test]
async fn sends_an_email_with_forgot_password_instructions() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    let response = app
        .request(
            Method::POST,
            "/forgot-password",
            Some(json!({
                "email": user.email,
                "reset_password_url": "https://app.test/reset",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    settle().await;

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@test.com");
    assert_eq!(sent[0].from, "no-reply@roleplay.com");
    assert!(sent[0].subject.contains("password recovery"));
    assert!(sent[0].body.contains("alice"));
    assert!(sent[0].body.contains("https://app.test/reset?token="));
}

#[tokio::test]
async fn creates_a_reset_password_token() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    let response = app
        .request(
            Method::POST,
            "/forgot-password",
            Some(json!({
                "email": user.email,
                "reset_password_url": "https://app.test/reset",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let token = stored_token(&app, user.id).await;
    assert!(token.is_some());
}

#[tokio::test]
async fn a_second_forgot_password_replaces_the_token() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    let payload = json!({
        "email": user.email,
        "reset_password_url": "https://app.test/reset",
    });

    app.request(Method::POST, "/forgot-password", Some(payload.clone()), None)
        .await;
    let first = stored_token(&app, user.id).await.unwrap();

    app.request(Method::POST, "/forgot-password", Some(payload), None)
        .await;
    let second = stored_token(&app, user.id).await.unwrap();

    // Same row slot, fresh token value.
    assert_ne!(first.token, second.token);
    let rows = password_reset_token::Entity::find()
        .filter(password_reset_token::Column::UserId.eq(user.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn returns_404_for_an_unknown_email() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/forgot-password",
            Some(json!({
                "email": "ghost@test.com",
                "reset_password_url": "https://app.test/reset",
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn returns_422_when_forgot_password_data_is_invalid() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/forgot-password", Some(json!({})), None)
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn resets_the_password_and_consumes_the_token() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    app.request(
        Method::POST,
        "/forgot-password",
        Some(json!({
            "email": user.email,
            "reset_password_url": "https://app.test/reset",
        })),
        None,
    )
    .await;
    let token = stored_token(&app, user.id).await.unwrap().token;

    let response = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": token, "password": "new-password-1" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The new password is live.
    let login = app
        .request(
            Method::POST,
            "/sessions",
            Some(json!({ "email": user.email, "password": "new-password-1" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::CREATED);

    // And the token row is gone.
    assert!(stored_token(&app, user.id).await.is_none());
}

#[tokio::test]
async fn replaying_a_consumed_token_returns_404() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    app.request(
        Method::POST,
        "/forgot-password",
        Some(json!({
            "email": user.email,
            "reset_password_url": "https://app.test/reset",
        })),
        None,
    )
    .await;
    let token = stored_token(&app, user.id).await.unwrap().token;

    let first = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": token, "password": "new-password-1" })),
            None,
        )
        .await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let replay = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": token, "password": "new-password-2" })),
            None,
        )
        .await;
    assert_eq!(replay.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn returns_410_for_an_expired_token() {
    let app = TestApp::new().await;
    let user = app.create_user_and_login("alice@test.com", "alice").await;

    app.request(
        Method::POST,
        "/forgot-password",
        Some(json!({
            "email": user.email,
            "reset_password_url": "https://app.test/reset",
        })),
        None,
    )
    .await;

    // Age the token past the two-hour window.
    let row = stored_token(&app, user.id).await.unwrap();
    let token = row.token.clone();
    let mut active: password_reset_token::ActiveModel = row.into();
    active.created_at = Set(Utc::now() - Duration::hours(3));
    active.update(&*app.state.db).await.unwrap();

    let response = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": token, "password": "new-password-1" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::GONE);
    let body = response_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["status"], 410);

    // An expired token does not change the password.
    let login = app
        .request(
            Method::POST,
            "/sessions",
            Some(json!({ "email": user.email, "password": "12345678" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn returns_404_for_an_unknown_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": "never-issued", "password": "new-password-1" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn returns_422_for_a_short_replacement_password() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/reset-password",
            Some(json!({ "token": "whatever", "password": "1234" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
