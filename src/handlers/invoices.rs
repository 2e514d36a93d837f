use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::invoices::{InvoiceResponse, InvoiceSummary},
    ApiResponse, AppState, ListQuery, Page,
};

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Invoices retrieved", body = ApiResponse<Page<InvoiceSummary>>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<InvoiceSummary>>>, ServiceError> {
    if !auth_user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Listing all invoices requires the ADMIN role".to_string(),
        ));
    }
    let page = state
        .services
        .invoices
        .list_invoices(query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice retrieved", body = ApiResponse<InvoiceResponse>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ServiceError> {
    let invoice = state.services.invoices.get_invoice(id).await?;
    if invoice.summary.user_id != auth_user.user_id && !auth_user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Invoices are visible to their owner only".to_string(),
        ));
    }
    Ok(Json(ApiResponse::ok(invoice)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice))
}
