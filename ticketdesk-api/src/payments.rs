use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ticketdesk_booking::{supported_methods, SUPPORTED_BANKS};
use ticketdesk_core::{Payment, PaymentDetails, PaymentMethod, SessionContext};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct MethodInfo {
    method: PaymentMethod,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct PaymentMethodsResponse {
    methods: Vec<MethodInfo>,
    banks: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub method: PaymentMethod,
    pub details: PaymentDetails,
}

/// Public payment metadata.
pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/payments/methods", get(list_methods))
}

/// Payment submission; mounted behind customer auth.
pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{id}/payment", post(submit_payment))
}

async fn list_methods() -> Json<PaymentMethodsResponse> {
    let methods = supported_methods()
        .iter()
        .map(|m| MethodInfo {
            method: *m,
            kind: if m.is_mobile_wallet() { "mobile_wallet" } else { "bank_transfer" },
        })
        .collect();

    Json(PaymentMethodsResponse {
        methods,
        banks: &SUPPORTED_BANKS,
    })
}

async fn submit_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitPaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .payments
        .submit_payment(&ctx, id, req.method, req.details)
        .await?;
    Ok(Json(payment))
}
