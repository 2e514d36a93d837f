//! Librera API Library
//!
//! Backend for an online bookstore: catalog, accounts, checkout,
//! invoicing, payment reconciliation and sales reporting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::services::{
    books::BookService, categories::CategoryService, invoices::InvoiceService,
    payments::PaymentService, reports::ReportService, storage::StorageService, users::UserService,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub auth: auth::AuthService,
    pub events: events::EventSender,
    pub services: AppServices,
}

#[derive(Clone)]
pub struct AppServices {
    pub books: Arc<BookService>,
    pub categories: Arc<CategoryService>,
    pub users: Arc<UserService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub reports: Arc<ReportService>,
    pub storage: Arc<StorageService>,
}

impl AppState {
    /// Wires every service against one pool and one event channel.
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, events: events::EventSender) -> Self {
        let auth = auth::AuthService::new(
            &config.jwt_secret,
            Duration::from_secs(config.jwt_expiration_secs),
        );

        let payments = Arc::new(PaymentService::new(db.clone(), events.clone()));
        let services = AppServices {
            books: Arc::new(BookService::new(db.clone(), events.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            users: Arc::new(UserService::new(
                db.clone(),
                auth.clone(),
                events.clone(),
                config.jwt_expiration_secs,
            )),
            invoices: Arc::new(InvoiceService::new(
                db.clone(),
                events.clone(),
                payments.clone(),
                config.tax_rate,
                config.shipping_fee,
            )),
            payments,
            reports: Arc::new(ReportService::new(db.clone())),
            storage: Arc::new(StorageService::new(config.storage.clone())),
        };

        Self {
            db,
            config,
            auth,
            events,
            services,
        }
    }
}

/// Common query parameters for list endpoints. Pages are 1-based.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    20
}

/// Standard success envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, page: u64, size: u64) -> Self {
        // A zero page size yields no pages rather than a division panic.
        let total_pages = if total_items == 0 || size == 0 {
            0
        } else {
            (total_items + size - 1) / size
        };
        Self {
            items,
            total_items,
            total_pages,
            page,
            size,
        }
    }

    /// Pages an already-materialized result set in memory. Used for the
    /// grouped report queries where the database does the aggregation
    /// but not the paging.
    pub fn from_all(all: Vec<T>, page: u64, size: u64) -> Self {
        let total_items = all.len() as u64;
        let offset = page.saturating_sub(1).saturating_mul(size) as usize;
        let items: Vec<T> = all
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .collect();
        Self::new(items, total_items, page, size)
    }
}

/// Builds the full application router with middleware.
pub fn app(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer,
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    };
    use utoipa_swagger_ui::SwaggerUi;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1/books", handlers::books::routes())
        .nest("/api/v1/categories", handlers::categories::routes())
        .nest("/api/v1/users", handlers::users::routes())
        .nest("/api/v1/orders", handlers::orders::routes())
        .nest("/api/v1/invoices", handlers::invoices::routes())
        .nest("/api/v1/payments", handlers::payments::routes())
        .nest("/api/v1/reports", handlers::reports::routes())
        .nest("/api/v1/files", handlers::storage::routes())
        .merge(handlers::health::routes())
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::api_doc()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
