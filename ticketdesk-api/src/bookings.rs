use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use ticketdesk_booking::CancellationReceipt;
use ticketdesk_core::{Booking, BookingDetails, CreateBookingRequest, Paginated, SessionContext};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Mounted behind customer auth.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create_booking(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<BookingDetails>>, AppError> {
    let page = state.bookings.policy().page_request(params.page, params.per_page);
    Ok(Json(state.bookings.list_bookings(&ctx, page).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetails>, AppError> {
    Ok(Json(state.bookings.get_booking(&ctx, id).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationReceipt>, AppError> {
    Ok(Json(state.bookings.cancel_booking(&ctx, id, Utc::now()).await?))
}
