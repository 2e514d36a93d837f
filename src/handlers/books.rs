use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::books::{BookPatch, BookResponse, CreateBookRequest},
    ApiResponse, AppState, ListQuery, Page,
};

fn require_admin(user: &AuthUser) -> Result<(), ServiceError> {
    if !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Catalog changes require the ADMIN role".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("size" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Books retrieved", body = ApiResponse<Page<BookResponse>>),
        (status = 400, description = "Invalid paging", body = crate::errors::ErrorResponse),
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<BookResponse>>>, ServiceError> {
    let page = state
        .services
        .books
        .list_books(query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book retrieved", body = ApiResponse<BookResponse>),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookResponse>>, ServiceError> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(ApiResponse::ok(book)))
}

#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = ApiResponse<BookResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 409, description = "ISBN already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookResponse>>), ServiceError> {
    require_admin(&auth_user)?;
    let book = state.services.books.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(book))))
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body = CreateBookRequest,
    responses(
        (status = 200, description = "Book replaced", body = ApiResponse<BookResponse>),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "ISBN already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<CreateBookRequest>,
) -> Result<Json<ApiResponse<BookResponse>>, ServiceError> {
    require_admin(&auth_user)?;
    let book = state.services.books.update_book(id, request).await?;
    Ok(Json(ApiResponse::ok(book)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookPatch,
    responses(
        (status = 200, description = "Book updated", body = ApiResponse<BookResponse>),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Books"
)]
pub async fn patch_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<ApiResponse<BookResponse>>, ServiceError> {
    require_admin(&auth_user)?;
    let book = state.services.books.patch_book(id, patch).await?;
    Ok(Json(ApiResponse::ok(book)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = ApiResponse<String>),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    require_admin(&auth_user)?;
    state.services.books.delete_book(id).await?;
    Ok(Json(ApiResponse::message(format!("Book {id} deleted"))))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/:id",
            get(get_book)
                .put(update_book)
                .patch(patch_book)
                .delete(delete_book),
        )
}
