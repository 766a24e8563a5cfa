pub mod ledger;

pub use ledger::{InventoryLedger, SeatReservation, SeatRelease};
