pub mod manager;
pub mod payments;
pub mod search;

pub use manager::{BookingManager, BookingPolicy, CancellationReceipt};
pub use payments::{supported_methods, validate_payment, PaymentManager, SUPPORTED_BANKS};
pub use search::SearchService;
