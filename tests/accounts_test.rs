//! Registration, login and the account-scoped reads.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, TestApp};
use serde_json::json;

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn register_then_login() {
    let app = TestApp::new().await;

    let body = assert_status(
        app.request(
            Method::POST,
            "/api/v1/users/register",
            None,
            Some(json!({
                "name": "Ana",
                "last_name": "Gomez",
                "email": "ana@example.com",
                "password": "plenty-long-password"
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(body["data"]["roles"], json!(["USER"]));
    assert!(body["data"].get("password_hash").is_none());

    let body = assert_status(
        app.request(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({
                "email": "ana@example.com",
                "password": "plenty-long-password"
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let token = body["data"]["token"].as_str().expect("token").to_string();

    let body = assert_status(
        app.request(Method::GET, "/api/v1/users/me", Some(&token), None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["email"], "ana@example.com");
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let payload = json!({
        "name": "Bo",
        "last_name": "Lin",
        "email": "bo@example.com",
        "password": "plenty-long-password"
    });

    assert_status(
        app.request(Method::POST, "/api/v1/users/register", None, Some(payload.clone()))
            .await,
        StatusCode::CREATED,
    )
    .await;
    assert_status(
        app.request(Method::POST, "/api/v1/users/register", None, Some(payload))
            .await,
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn wrong_password_and_unknown_user_look_alike() {
    let app = TestApp::new().await;
    app.seed_user("known@example.com", &["USER"]).await;

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({ "email": "known@example.com", "password": "nope-nope" })),
        )
        .await;
    let missing = app
        .request(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "nope-nope" })),
        )
        .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn accounts_are_owner_scoped() {
    let app = TestApp::new().await;
    let (alice_id, _) = app.seed_user("alice@example.com", &["USER"]).await;
    let (_, bob_token) = app.seed_user("bob@example.com", &["USER"]).await;
    let (_, admin_token) = app.seed_user("root@example.com", &["ADMIN"]).await;

    assert_status(
        app.request(
            Method::GET,
            &format!("/api/v1/users/{alice_id}"),
            Some(&bob_token),
            None,
        )
        .await,
        StatusCode::FORBIDDEN,
    )
    .await;

    assert_status(
        app.request(
            Method::GET,
            &format!("/api/v1/users/{alice_id}"),
            Some(&admin_token),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn weak_registrations_are_rejected() {
    let app = TestApp::new().await;

    let short_password = app
        .request(
            Method::POST,
            "/api/v1/users/register",
            None,
            Some(json!({
                "name": "X",
                "last_name": "Y",
                "email": "xy@example.com",
                "password": "short"
            })),
        )
        .await;
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);

    let bad_email = app
        .request(
            Method::POST,
            "/api/v1/users/register",
            None,
            Some(json!({
                "name": "X",
                "last_name": "Y",
                "email": "not-an-email",
                "password": "plenty-long-password"
            })),
        )
        .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
}
