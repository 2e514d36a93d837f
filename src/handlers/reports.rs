use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::reports::{BestSellerRow, CategorySalesRow, MonthlySalesRow},
    ApiResponse, AppState, ListQuery, Page,
};

fn require_admin(user: &AuthUser) -> Result<(), ServiceError> {
    if !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Sales reports require the ADMIN role".to_string(),
        ));
    }
    Ok(())
}

/// Revenue scalars computed in one endpoint so dashboards need a single
/// round trip. Averages are None when there are no invoices yet.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub total_books_sold: i64,
    pub average_invoice_total: Option<Decimal>,
    pub average_books_per_invoice: Option<Decimal>,
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/best-sellers",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Best selling books", body = ApiResponse<Page<BestSellerRow>>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn best_sellers(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<BestSellerRow>>>, ServiceError> {
    require_admin(&auth_user)?;
    let page = state
        .services
        .reports
        .best_sellers_page(query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly-sales",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Sales grouped by month", body = ApiResponse<Page<MonthlySalesRow>>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn monthly_sales(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<MonthlySalesRow>>>, ServiceError> {
    require_admin(&auth_user)?;
    let page = state
        .services
        .reports
        .monthly_sales(query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/category-sales",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Sales grouped by category", body = ApiResponse<Page<CategorySalesRow>>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn category_sales(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<CategorySalesRow>>>, ServiceError> {
    require_admin(&auth_user)?;
    let page = state
        .services
        .reports
        .sales_by_category(query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    responses(
        (status = 200, description = "Aggregate sales figures", body = ApiResponse<SalesSummary>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<SalesSummary>>, ServiceError> {
    require_admin(&auth_user)?;
    let reports = &state.services.reports;

    let total_revenue = reports.total_revenue().await?;
    let total_books_sold = reports.total_books_sold().await?;
    let average_invoice_total = match reports.average_invoice_total().await {
        Ok(value) => Some(value),
        Err(ServiceError::NoData(_)) => None,
        Err(e) => return Err(e),
    };
    let average_books_per_invoice = match reports.average_books_per_invoice().await {
        Ok(value) => Some(value),
        Err(ServiceError::NoData(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(Json(ApiResponse::ok(SalesSummary {
        total_revenue,
        total_books_sold,
        average_invoice_total,
        average_books_per_invoice,
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/best-sellers", get(best_sellers))
        .route("/monthly-sales", get(monthly_sales))
        .route("/category-sales", get(category_sales))
        .route("/summary", get(summary))
}
