use std::sync::Arc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use uuid::Uuid;
use ticketdesk_core::{
    discard, BookingError, BookingResult, Payment, PaymentDetails, PaymentMethod, PaymentStatus,
    SessionContext, StoreTransaction, UnitOfWork,
};

/// Banks offered on the bank transfer form.
pub const SUPPORTED_BANKS: [&str; 11] = [
    "Sonali Bank",
    "Janata Bank",
    "Agrani Bank",
    "Rupali Bank",
    "Bangladesh Krishi Bank",
    "Islami Bank Bangladesh",
    "Dutch-Bangla Bank",
    "BRAC Bank",
    "Eastern Bank",
    "City Bank",
    "Other",
];

const PIN_LENGTH: usize = 5;

// 11-digit Bangladeshi mobile number
static MOBILE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^01[3-9][0-9]{8}$").expect("mobile number pattern is valid")
});

pub fn supported_methods() -> &'static [PaymentMethod] {
    &PaymentMethod::ALL
}

fn require<'a>(field: &'static str, value: &'a str) -> BookingResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BookingError::invalid_payment(field, "is required"));
    }
    Ok(value)
}

/// Checks the submitted details against the method and returns the label
/// recorded on the payment, e.g. `"Bank Transfer (BRAC Bank)"`.
pub fn validate_payment(method: PaymentMethod, details: &PaymentDetails) -> BookingResult<String> {
    match (method.is_mobile_wallet(), details) {
        (
            true,
            PaymentDetails::MobileWallet {
                mobile_number,
                transaction_id,
                pin,
            },
        ) => {
            let mobile_number = require("mobile_number", mobile_number)?;
            require("transaction_id", transaction_id)?;
            let pin = require("pin", pin.expose())?;

            if !MOBILE_NUMBER.is_match(mobile_number) {
                return Err(BookingError::invalid_payment(
                    "mobile_number",
                    "must be an 11-digit number starting with 013-019",
                ));
            }

            if pin.len() != PIN_LENGTH || !pin.bytes().all(|b| b.is_ascii_digit()) {
                return Err(BookingError::invalid_payment(
                    "pin",
                    format!("must be exactly {} digits", PIN_LENGTH),
                ));
            }

            Ok(method.label().to_string())
        }
        (
            false,
            PaymentDetails::BankTransfer {
                bank_name,
                transaction_id,
            },
        ) => {
            let bank_name = require("bank_name", bank_name)?;
            if !SUPPORTED_BANKS.contains(&bank_name) {
                return Err(BookingError::invalid_payment(
                    "bank_name",
                    format!("unsupported bank '{}'", bank_name),
                ));
            }
            require("transaction_id", transaction_id)?;

            Ok(format!("{} ({})", method.label(), bank_name))
        }
        _ => Err(BookingError::invalid_payment(
            "method",
            format!("details do not match payment method {}", method.label()),
        )),
    }
}

/// Confirms the pending payment of a booking. No money moves.
pub struct PaymentManager {
    store: Arc<dyn UnitOfWork>,
}

impl PaymentManager {
    pub fn new(store: Arc<dyn UnitOfWork>) -> Self {
        Self { store }
    }

    pub async fn submit_payment(
        &self,
        ctx: &SessionContext,
        booking_id: Uuid,
        method: PaymentMethod,
        details: PaymentDetails,
    ) -> BookingResult<Payment> {
        let label = validate_payment(method, &details)?;

        let mut tx = self.store.begin().await.map_err(BookingError::TransactionFailed)?;

        let (payment, changed) = match confirm(tx.as_mut(), ctx, booking_id, label, &details).await {
            Ok(outcome) => outcome,
            Err(e) => {
                discard(tx).await;
                return Err(e);
            }
        };

        if !changed {
            discard(tx).await;
            info!("Payment for booking {} already confirmed, nothing to do", booking_id);
            return Ok(payment);
        }

        tx.commit().await.map_err(BookingError::TransactionFailed)?;

        info!("Payment {} for booking {} confirmed via {}", payment.id, booking_id, payment.method);
        Ok(payment)
    }
}

async fn confirm(
    tx: &mut dyn StoreTransaction,
    ctx: &SessionContext,
    booking_id: Uuid,
    label: String,
    details: &PaymentDetails,
) -> BookingResult<(Payment, bool)> {
    let booking = tx
        .lock_booking(booking_id)
        .await
        .map_err(BookingError::TransactionFailed)?
        .filter(|b| b.is_owned_by(ctx.user_id))
        .ok_or_else(|| BookingError::not_found("booking", booking_id))?;

    if booking.is_cancelled() {
        return Err(BookingError::AlreadyCancelled(booking_id));
    }

    let mut payment = tx
        .lock_payment(booking_id)
        .await
        .map_err(BookingError::TransactionFailed)?
        .ok_or_else(|| BookingError::not_found("payment", booking_id))?;

    match payment.status {
        PaymentStatus::Success => Ok((payment, false)),
        PaymentStatus::Refunded => Err(BookingError::AlreadyCancelled(booking_id)),
        PaymentStatus::Pending => {
            payment.mark_success(label, details.transaction_id().trim().to_string());
            tx.update_payment(&payment)
                .await
                .map_err(BookingError::TransactionFailed)?;
            Ok((payment, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(number: &str, txid: &str, pin: &str) -> PaymentDetails {
        PaymentDetails::MobileWallet {
            mobile_number: number.to_string(),
            transaction_id: txid.to_string(),
            pin: pin.into(),
        }
    }

    fn bank(name: &str, txid: &str) -> PaymentDetails {
        PaymentDetails::BankTransfer {
            bank_name: name.to_string(),
            transaction_id: txid.to_string(),
        }
    }

    fn field_of(result: BookingResult<String>) -> &'static str {
        match result {
            Err(BookingError::InvalidPaymentDetails { field, .. }) => field,
            other => panic!("expected invalid payment details, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_wallet_payment() {
        let label = validate_payment(PaymentMethod::BKash, &wallet("01712345678", "TX9", "12345")).unwrap();
        assert_eq!(label, "bKash");
    }

    #[test]
    fn test_mobile_number_pattern() {
        for bad in ["0123456789", "01212345678", "0171234567", "017123456789", "+8801712345678", "017১২৩৪৫৬৭৮"] {
            let result = validate_payment(PaymentMethod::Nagad, &wallet(bad, "TX9", "12345"));
            assert_eq!(field_of(result), "mobile_number", "{}", bad);
        }
        for good in ["01312345678", "01912345678"] {
            assert!(validate_payment(PaymentMethod::Rocket, &wallet(good, "TX9", "12345")).is_ok());
        }
    }

    #[test]
    fn test_pin_rules() {
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &wallet("01712345678", "TX9", "1234"))), "pin");
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &wallet("01712345678", "TX9", "12a45"))), "pin");
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &wallet("01712345678", "TX9", "١٢٣٤٥"))), "pin");
    }

    #[test]
    fn test_validation_order() {
        // kind mismatch wins over everything else
        assert_eq!(field_of(validate_payment(PaymentMethod::BankTransfer, &wallet("", "", ""))), "method");
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &bank("BRAC Bank", "TX"))), "method");

        // empty fields come before format checks
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &wallet("0123", "", "1"))), "transaction_id");
        assert_eq!(field_of(validate_payment(PaymentMethod::BKash, &wallet("0123", "TX", " "))), "pin");
    }

    #[test]
    fn test_bank_transfer() {
        let label = validate_payment(PaymentMethod::BankTransfer, &bank("BRAC Bank", "BT-1")).unwrap();
        assert_eq!(label, "Bank Transfer (BRAC Bank)");

        assert_eq!(field_of(validate_payment(PaymentMethod::BankTransfer, &bank("Swiss Bank", "BT-1"))), "bank_name");
        assert_eq!(field_of(validate_payment(PaymentMethod::BankTransfer, &bank("City Bank", ""))), "transaction_id");
    }

    #[test]
    fn test_supported_methods() {
        assert_eq!(supported_methods().len(), 4);
        assert!(SUPPORTED_BANKS.contains(&"Dutch-Bangla Bank"));
    }
}
