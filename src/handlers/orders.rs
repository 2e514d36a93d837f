use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::invoices::{BillingDetails, CreateOrderRequest, InvoiceResponse, OrderResponse},
    ApiResponse, AppState,
};

fn require_owner(user: &AuthUser, owner_id: i64) -> Result<(), ServiceError> {
    if user.user_id != owner_id && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Orders are visible to their owner only".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order recorded", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    require_owner(&auth_user, request.user_id)?;
    let order = state.services.invoices.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order request id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.invoices.get_order(id).await?;
    require_owner(&auth_user, order.user_id)?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Opens a payment session for the order, producing its invoice.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/invoice",
    params(("id" = Uuid, Path, description = "Order request id")),
    request_body = BillingDetails,
    responses(
        (status = 201, description = "Payment session opened", body = ApiResponse<InvoiceResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already invoiced", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn begin_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(billing): Json<BillingDetails>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceResponse>>), ServiceError> {
    let order = state.services.invoices.get_order(id).await?;
    require_owner(&auth_user, order.user_id)?;

    let invoice = state.services.invoices.begin_payment(id, billing).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(invoice))))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/invoice", post(begin_payment))
}
