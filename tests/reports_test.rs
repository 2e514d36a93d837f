//! Sales statistics computed over settled checkout history.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

/// Runs one order through checkout and approval so invoice history
/// exists for the aggregates.
async fn place_paid_order(app: &TestApp, user_id: i64, token: &str, book_id: i64, quantity: i32) {
    let body = assert_status(
        app.request(
            Method::POST,
            "/api/v1/orders",
            Some(token),
            Some(json!({
                "user_id": user_id,
                "items": [{ "book_id": book_id, "quantity": quantity }],
                "address": { "city": "Rosario", "street": "Mitre", "zip_code": "S2000", "number": 55 },
                "shipping_method": "pick_up",
                "payment_method": "credit_card"
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let body = assert_status(
        app.request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/invoice"),
            Some(token),
            Some(json!({})),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let preference_id = body["data"]["preference_id"].as_str().unwrap().to_string();
    let total = body["data"]["total"].as_str().unwrap().to_string();

    assert_status(
        app.request(
            Method::POST,
            "/api/v1/payments/webhook",
            None,
            Some(json!({
                "preference_id": preference_id,
                "status": "approved",
                "amount": total
            })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn best_sellers_order_by_quantity() {
    let app = TestApp::new().await;
    let (user_id, token) = app.seed_user("stats@example.com", &["USER"]).await;
    let (_, admin_token) = app.seed_user("boss@example.com", &["ADMIN"]).await;

    let slow = app.seed_book("9786000000001", "Slow Seller", dec!(10.00), 50).await;
    let fast = app.seed_book("9786000000002", "Fast Seller", dec!(10.00), 50).await;

    place_paid_order(&app, user_id, &token, slow, 1).await;
    place_paid_order(&app, user_id, &token, fast, 4).await;

    let body = assert_status(
        app.request(Method::GET, "/api/v1/reports/best-sellers", Some(&admin_token), None)
            .await,
        StatusCode::OK,
    )
    .await;
    let items = body["data"]["items"].as_array().expect("rows");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Fast Seller");
    assert_eq!(items[0]["total_quantity"], 4);
    assert_eq!(items[1]["title"], "Slow Seller");
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn summary_with_history() {
    let app = TestApp::new().await;
    let (user_id, token) = app.seed_user("sum@example.com", &["USER"]).await;
    let (_, admin_token) = app.seed_user("chief@example.com", &["ADMIN"]).await;
    let book = app.seed_book("9786000000003", "Ledger Lines", dec!(10.00), 50).await;

    // Two pickup orders of 1 and 3 copies: totals 12.10 and 36.30.
    place_paid_order(&app, user_id, &token, book, 1).await;
    place_paid_order(&app, user_id, &token, book, 3).await;

    let body = assert_status(
        app.request(Method::GET, "/api/v1/reports/summary", Some(&admin_token), None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["total_revenue"], "48.40");
    assert_eq!(body["data"]["total_books_sold"], 4);
    assert_eq!(body["data"]["average_invoice_total"], "24.20");
    assert_eq!(body["data"]["average_books_per_invoice"], "2.00");
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn summary_without_history_has_no_averages() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("empty@example.com", &["ADMIN"]).await;

    let body = assert_status(
        app.request(Method::GET, "/api/v1/reports/summary", Some(&admin_token), None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["total_revenue"], "0");
    assert_eq!(body["data"]["total_books_sold"], 0);
    assert!(body["data"]["average_invoice_total"].is_null());
    assert!(body["data"]["average_books_per_invoice"].is_null());
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn reports_require_admin() {
    let app = TestApp::new().await;
    let (_, user_token) = app.seed_user("nosy@example.com", &["USER"]).await;

    for path in [
        "/api/v1/reports/best-sellers",
        "/api/v1/reports/monthly-sales",
        "/api/v1/reports/category-sales",
        "/api/v1/reports/summary",
    ] {
        let response = app.request(Method::GET, path, Some(&user_token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "path {path}");
    }
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn monthly_sales_group_current_month() {
    let app = TestApp::new().await;
    let (user_id, token) = app.seed_user("cal@example.com", &["USER"]).await;
    let (_, admin_token) = app.seed_user("calendar@example.com", &["ADMIN"]).await;
    let book = app.seed_book("9786000000004", "Month by Month", dec!(10.00), 50).await;

    place_paid_order(&app, user_id, &token, book, 1).await;
    place_paid_order(&app, user_id, &token, book, 1).await;

    let body = assert_status(
        app.request(Method::GET, "/api/v1/reports/monthly-sales", Some(&admin_token), None)
            .await,
        StatusCode::OK,
    )
    .await;
    let items = body["data"]["items"].as_array().expect("rows");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["invoice_count"], 2);
}
