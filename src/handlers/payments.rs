use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::payments::{PaymentEvent, PaymentOutcome},
    ApiResponse, AppState,
};

type HmacSha256 = Hmac<Sha256>;

/// Payment provider callback. The body is read raw so the signature is
/// computed over the exact bytes that were signed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = PaymentEvent,
    responses(
        (status = 200, description = "Confirmation applied", body = ApiResponse<PaymentOutcome>),
        (status = 400, description = "Invalid payload or mismatched amount", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown preference id", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already settled", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unrecognized payment status", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<PaymentOutcome>>, ServiceError> {
    if let Some(secret) = &state.config.payment_webhook_secret {
        let ok = verify_signature(
            &headers,
            &body,
            secret,
            state.config.payment_webhook_tolerance_secs,
        );
        if !ok {
            warn!("payment webhook signature verification failed");
            return Err(ServiceError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }
    }

    let event: PaymentEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid webhook payload: {e}")))?;

    let outcome = state.services.payments.reconcile_by_preference(event).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// Manual confirmation path for operators, addressed by invoice id.
#[utoipa::path(
    post,
    path = "/api/v1/payments/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = PaymentEvent,
    responses(
        (status = 200, description = "Confirmation applied", body = ApiResponse<PaymentOutcome>),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already settled", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(event): Json<PaymentEvent>,
) -> Result<Json<ApiResponse<PaymentOutcome>>, ServiceError> {
    if !auth_user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Manual payment confirmation requires the ADMIN role".to_string(),
        ));
    }
    let outcome = state.services.invoices.process_payment(id, event).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// HMAC-SHA256 over `{timestamp}.{body}` carried in the x-timestamp and
/// x-signature headers. Stale timestamps are rejected.
fn verify_signature(headers: &HeaderMap, payload: &Bytes, secret: &str, tolerance_secs: u64) -> bool {
    let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) else {
        return false;
    };
    let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) else {
        return false;
    };

    if let Ok(ts_i) = ts.parse::<i64>() {
        let now = chrono::Utc::now().timestamp();
        if (now - ts_i).unsigned_abs() > tolerance_secs {
            return false;
        }
    } else {
        return false;
    }

    let signed = format!("{}.{}", ts, std::str::from_utf8(payload).unwrap_or(""));
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, sig)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(payment_webhook))
        .route("/invoices/:id", post(confirm_payment))
}
