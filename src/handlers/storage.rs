use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};

use crate::{
    auth::AuthUser, errors::ServiceError, services::storage::StoredObject, ApiResponse, AppState,
};

fn require_admin(user: &AuthUser) -> Result<(), ServiceError> {
    if !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "File management requires the ADMIN role".to_string(),
        ));
    }
    Ok(())
}

/// Accepts the first file part of a multipart form and stores it.
#[utoipa::path(
    post,
    path = "/api/v1/files",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = ApiResponse<StoredObject>),
        (status = 400, description = "No file part in the form", body = crate::errors::ErrorResponse),
        (status = 502, description = "Object store rejected the upload", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StoredObject>>), ServiceError> {
    require_admin(&auth_user)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::BadRequest(format!("failed to read file part: {e}")))?;

        let stored = state
            .services
            .storage
            .upload(&filename, &content_type, bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))));
    }

    Err(ServiceError::BadRequest(
        "multipart form must contain a 'file' part".to_string(),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{key}",
    params(("key" = String, Path, description = "Object key returned at upload")),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<String>),
        (status = 502, description = "Object store rejected the delete", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    require_admin(&auth_user)?;
    state.services.storage.delete(&key).await?;
    Ok(Json(ApiResponse::message(format!("File {key} deleted"))))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_file))
        .route("/:key", axum::routing::delete(delete_file))
}
