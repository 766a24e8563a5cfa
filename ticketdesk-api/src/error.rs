use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use ticketdesk_core::{AccountError, BookingError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

const INTERNAL: &str = "Internal Server Error";

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::Booking(e) => {
                let status = match e {
                    BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
                    BookingError::InsufficientSeats { .. } | BookingError::AlreadyCancelled(_) => StatusCode::CONFLICT,
                    BookingError::InvalidPassengerCount(_) | BookingError::InvalidPaymentDetails { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    BookingError::CancellationWindowClosed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    BookingError::TransactionFailed(_) | BookingError::CancellationFailed(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.kind())
            }
            AppError::Account(e) => match e {
                AccountError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
                AccountError::AlreadyExists => (StatusCode::CONFLICT, "already_exists"),
                AccountError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
                AccountError::Hashing(_) | AccountError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {:?}", self);
            INTERNAL.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
