//! Shared harness for the integration tests: an application state backed
//! by a throwaway SQLite database with migrations applied, plus helpers
//! for seeding accounts and catalog rows and for driving the router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, NotSet, QueryFilter, Set};
use serde_json::Value;
use tower::ServiceExt;

use librera_api::{
    config::{AppConfig, StorageConfig},
    entities::{app_user, app_user_role, book, user_role},
    events, AppState,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let cfg = test_config();

        // File-backed so every pooled connection sees the same database.
        let db_file = std::env::temp_dir().join(format!(
            "librera_test_{}.db",
            uuid::Uuid::new_v4().simple()
        ));
        let db = Database::connect(format!("sqlite://{}?mode=rwc", db_file.display()))
            .await
            .expect("sqlite test database");
        librera_api::db::run_migrations(&db)
            .await
            .expect("migrations");

        let (event_sender, event_rx) = events::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(db), cfg, event_sender);
        let router = librera_api::app(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Inserts a user with the given roles, creating the roles as needed.
    /// Returns the user id and a valid bearer token.
    pub async fn seed_user(&self, email: &str, roles: &[&str]) -> (i64, String) {
        let db = &*self.state.db;

        let hash = self
            .state
            .auth
            .hash_password("integration-password")
            .expect("hash");
        let user = app_user::ActiveModel {
            id: NotSet,
            name: Set("Test".to_string()),
            last_name: Set("Reader".to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash),
            date_created: Set(Utc::now()),
        }
        .insert(db)
        .await
        .expect("insert user");

        for role in roles {
            let existing = app_user_role::Entity::find()
                .filter(app_user_role::Column::Description.eq(*role))
                .one(db)
                .await
                .expect("find role");
            let role_row = match existing {
                Some(row) => row,
                None => app_user_role::ActiveModel {
                    id: NotSet,
                    description: Set(role.to_string()),
                }
                .insert(db)
                .await
                .expect("insert role"),
            };
            user_role::ActiveModel {
                user_id: Set(user.id),
                role_id: Set(role_row.id),
            }
            .insert(db)
            .await
            .expect("link role");
        }

        let token = self
            .state
            .auth
            .issue_token(
                user.id,
                email,
                roles.iter().map(|r| r.to_string()).collect(),
            )
            .expect("token");
        (user.id, token)
    }

    pub async fn seed_book(&self, isbn: &str, title: &str, price: Decimal, stock: i32) -> i64 {
        let saved = book::ActiveModel {
            id: NotSet,
            isbn: Set(isbn.to_string()),
            title: Set(title.to_string()),
            authors: Set("Test Author".to_string()),
            publisher: Set(None),
            description: Set(None),
            language: Set(Some("en".to_string())),
            image_url: Set(None),
            price: Set(price),
            currency_code: Set("EUR".to_string()),
            stock: Set(stock),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert book");
        saved.id
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        self.router.clone().oneshot(request).await.expect("response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn assert_status(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body = response_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: false,
        jwt_secret: "integration_test_secret_key_0123456789abcdef".to_string(),
        jwt_expiration_secs: 3600,
        tax_rate: Decimal::new(21, 2),
        shipping_fee: Decimal::new(500, 2),
        payment_webhook_secret: None,
        payment_webhook_tolerance_secs: 300,
        storage: StorageConfig::default(),
    }
}
