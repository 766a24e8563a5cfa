use uuid::Uuid;
use crate::repository::StoreError;

/// Every failure the booking core reports to its callers.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats {
        requested: i32,
        available: i32,
    },

    #[error("Invalid passenger count: {0}")]
    InvalidPassengerCount(String),

    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("Cancellation window closed: {hours_until_departure}h until departure, at least {cutoff_hours}h required")]
    CancellationWindowClosed {
        hours_until_departure: i64,
        cutoff_hours: i64,
    },

    #[error("Invalid payment details ({field}): {reason}")]
    InvalidPaymentDetails {
        field: &'static str,
        reason: String,
    },

    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] StoreError),

    #[error("Cancellation failed: {0}")]
    CancellationFailed(#[source] StoreError),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid_payment(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPaymentDetails {
            field,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InsufficientSeats { .. } => "insufficient_seats",
            Self::InvalidPassengerCount(_) => "invalid_passenger_count",
            Self::AlreadyCancelled(_) => "already_cancelled",
            Self::CancellationWindowClosed { .. } => "cancellation_window_closed",
            Self::InvalidPaymentDetails { .. } => "invalid_payment_details",
            Self::TransactionFailed(_) => "transaction_failed",
            Self::CancellationFailed(_) => "cancellation_failed",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User with this email or username already exists")]
    AlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Account storage failed: {0}")]
    Store(#[source] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_cause_is_kept_as_source() {
        let cause: StoreError = "connection reset".into();
        let err = BookingError::TransactionFailed(cause);

        assert_eq!(err.kind(), "transaction_failed");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_window_message() {
        let err = BookingError::CancellationWindowClosed { hours_until_departure: 2, cutoff_hours: 3 };
        assert_eq!(
            err.to_string(),
            "Cancellation window closed: 2h until departure, at least 3h required"
        );
    }
}
