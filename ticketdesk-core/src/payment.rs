use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::pii::Masked;

/// Method label stored on a payment before the user has paid.
pub const PENDING_METHOD: &str = "Pending";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Whether a cancellation should move this payment to `Refunded`.
    pub fn is_refundable(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Success)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// The monetary-confirmation record attached 1:1 to a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn pending(booking_id: Uuid, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            method: PENDING_METHOD.to_string(),
            transaction_id: None,
            status: PaymentStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn mark_success(&mut self, method: String, transaction_id: String) {
        self.method = method;
        self.transaction_id = Some(transaction_id);
        self.status = PaymentStatus::Success;
        self.updated_at = Utc::now();
    }

    pub fn mark_refunded(&mut self) {
        self.status = PaymentStatus::Refunded;
        self.updated_at = Utc::now();
    }
}

/// Local payment methods offered at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "bKash")]
    BKash,
    Nagad,
    Rocket,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::BKash,
        PaymentMethod::Nagad,
        PaymentMethod::Rocket,
        PaymentMethod::BankTransfer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::BKash => "bKash",
            PaymentMethod::Nagad => "Nagad",
            PaymentMethod::Rocket => "Rocket",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }

    pub fn is_mobile_wallet(&self) -> bool {
        !matches!(self, PaymentMethod::BankTransfer)
    }
}

/// Method-specific fields a payer submits. The PIN never shows up in logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentDetails {
    MobileWallet {
        mobile_number: String,
        transaction_id: String,
        pin: Masked<String>,
    },
    BankTransfer {
        bank_name: String,
        transaction_id: String,
    },
}

impl PaymentDetails {
    pub fn transaction_id(&self) -> &str {
        match self {
            PaymentDetails::MobileWallet { transaction_id, .. } => transaction_id,
            PaymentDetails::BankTransfer { transaction_id, .. } => transaction_id,
        }
    }
}
