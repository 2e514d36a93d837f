use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::invoices::InvoiceSummary,
    services::users::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    ApiResponse, AppState, ListQuery, Page,
};

fn require_self_or_admin(user: &AuthUser, target: i64) -> Result<(), ServiceError> {
    if user.user_id != target && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Access limited to the account owner".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    let response = state.services.users.login(request).await?;
    Ok(Json(ApiResponse::ok(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    let user = state.services.users.get_user(auth_user.user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account retrieved", body = ApiResponse<UserResponse>),
        (status = 403, description = "Not the account owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    require_self_or_admin(&auth_user, id)?;
    let user = state.services.users.get_user(id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/invoices",
    params(
        ("id" = i64, Path, description = "User id"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Invoices for the user", body = ApiResponse<Page<InvoiceSummary>>),
        (status = 403, description = "Not the account owner", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn list_user_invoices(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<InvoiceSummary>>>, ServiceError> {
    require_self_or_admin(&auth_user, id)?;
    let page = state
        .services
        .invoices
        .list_invoices_by_user(id, query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/:id", get(get_user))
        .route("/:id/invoices", get(list_user_invoices))
}
