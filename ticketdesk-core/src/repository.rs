use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;
use crate::booking::{Booking, BookingStatus};
use crate::payment::Payment;
use crate::route::Route;
use crate::search::{PageRequest, RouteQuery};
use crate::user::{NewUser, User};

/// Error type at the storage seam; callers wrap it into their own taxonomy.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Opens storage transactions spanning ledger, booking and payment writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}

/// A single storage transaction. The `lock_*` reads hold the row until the
/// transaction ends, so a read-modify-write on the same row cannot interleave
/// with another one. Dropping without `commit` discards every write.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn lock_route(&mut self, route_id: Uuid) -> Result<Option<Route>, StoreError>;

    async fn set_available_seats(&mut self, route_id: Uuid, available_seats: i32) -> Result<(), StoreError>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError>;

    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> Result<(), StoreError>;

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError>;

    async fn lock_payment(&mut self, booking_id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Roll back after a failed step. The caller reports the step's own error.
pub async fn discard(tx: Box<dyn StoreTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback failed: {}", e);
    }
}

/// Read-only route access for search pages.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, StoreError>;

    async fn search_routes(&self, query: &RouteQuery) -> Result<Vec<Route>, StoreError>;

    async fn suggest_routes(&self, query: &RouteQuery, limit: i64) -> Result<Vec<Route>, StoreError>;
}

/// Read-only booking access for the booking list and detail pages.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn get_payment(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn list_bookings(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<Booking>, StoreError>;

    async fn count_bookings(&self, user_id: Uuid) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn exists(&self, username: &str, email: &str) -> Result<bool, StoreError>;
}
