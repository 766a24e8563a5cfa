use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;
use uuid::Uuid;
use ticketdesk_core::{
    Booking, BookingRepository, BookingStatus, NewUser, PageRequest, Payment, Route, RouteQuery,
    RouteRepository, StoreError, StoreTransaction, UnitOfWork, User, UserRepository,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    routes: HashMap<Uuid, Route>,
    bookings: HashMap<Uuid, Booking>,
    /// Keyed by booking id; a booking has at most one payment.
    payments: HashMap<Uuid, Payment>,
    users: HashMap<Uuid, User>,
}

/// In-process store used when no database is configured, and by tests.
///
/// A transaction holds the store-wide lock from `begin` until it ends and
/// works on a staged copy, so uncommitted writes are never visible and a
/// dropped transaction leaves the store untouched.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_route(&self, route: Route) {
        self.state.lock().await.routes.insert(route.id, route);
    }

    /// Loads a JSON array of routes, replacing routes with the same id.
    pub async fn seed_routes_from_file(&self, path: impl AsRef<Path>) -> Result<usize, StoreError> {
        let routes = crate::seed::load_routes(path.as_ref())?;
        let count = routes.len();

        let mut state = self.state.lock().await;
        for route in routes {
            state.routes.insert(route.id, route);
        }

        info!("Seeded {} routes from {}", count, path.as_ref().display());
        Ok(count)
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_route(&mut self, route_id: Uuid) -> Result<Option<Route>, StoreError> {
        Ok(self.staged.routes.get(&route_id).cloned())
    }

    async fn set_available_seats(&mut self, route_id: Uuid, available_seats: i32) -> Result<(), StoreError> {
        let route = self
            .staged
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| format!("route {} vanished during update", route_id))?;

        if available_seats < 0 || available_seats > route.capacity {
            return Err(format!(
                "available seats {} outside 0..={} for route {}",
                available_seats, route.capacity, route_id
            )
            .into());
        }

        route.available_seats = available_seats;
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        if self.staged.bookings.contains_key(&booking.id) {
            return Err(format!("duplicate booking id {}", booking.id).into());
        }
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.staged.bookings.get(&booking_id).cloned())
    }

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> Result<(), StoreError> {
        let booking = self
            .staged
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| format!("booking {} vanished during update", booking_id))?;

        booking.status = status;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        if self.staged.payments.contains_key(&payment.booking_id) {
            return Err(format!("booking {} already has a payment", payment.booking_id).into());
        }
        self.staged.payments.insert(payment.booking_id, payment.clone());
        Ok(())
    }

    async fn lock_payment(&mut self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.staged.payments.get(&booking_id).cloned())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        let slot = self
            .staged
            .payments
            .get_mut(&payment.booking_id)
            .ok_or_else(|| format!("payment for booking {} vanished during update", payment.booking_id))?;

        *slot = payment.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RouteRepository for MemoryStore {
    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, StoreError> {
        Ok(self.state.lock().await.routes.get(&id).cloned())
    }

    async fn search_routes(&self, query: &RouteQuery) -> Result<Vec<Route>, StoreError> {
        let state = self.state.lock().await;
        let mut routes: Vec<Route> = state
            .routes
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        routes.sort_by_key(|r| r.departure_time);
        Ok(routes)
    }

    async fn suggest_routes(&self, query: &RouteQuery, limit: i64) -> Result<Vec<Route>, StoreError> {
        let state = self.state.lock().await;
        let mut routes: Vec<Route> = state
            .routes
            .values()
            .filter(|r| query.matches_loosely(r))
            .cloned()
            .collect();

        routes.sort_by_key(|r| r.departure_time);
        routes.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(routes)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn get_payment(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.state.lock().await.payments.get(&booking_id).cloned())
    }

    async fn list_bookings(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();

        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);
        Ok(bookings.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_bookings(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        let count = state.bookings.values().filter(|b| b.user_id == user_id).count();
        Ok(count as i64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        let taken = state.users.values().any(|u| {
            u.username == user.username || u.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(format!("user {} already exists", user.username).into());
        }

        let user = user.into_user();
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        let email = email.trim();
        Ok(state.users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        let (username, email) = (username.trim(), email.trim());
        Ok(state
            .users
            .values()
            .any(|u| u.username == username || u.email.eq_ignore_ascii_case(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn route(seats: i32) -> Route {
        let departure = Utc::now() + Duration::days(2);
        Route {
            id: Uuid::new_v4(),
            departure_city: "Dhaka".to_string(),
            arrival_city: "Sylhet".to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::hours(6),
            transport_type: "Bus".to_string(),
            vehicle_name: "Green Line".to_string(),
            vehicle_number: "GL-12".to_string(),
            price: 800,
            capacity: 40,
            available_seats: seats,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let store = MemoryStore::new();
        let r = route(40);
        store.insert_route(r.clone()).await;

        let mut tx = store.begin().await.unwrap();
        tx.set_available_seats(r.id, 30).await.unwrap();
        tx.commit().await.unwrap();

        let after = store.get_route(r.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 30);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = MemoryStore::new();
        let r = route(40);
        store.insert_route(r.clone()).await;

        let mut tx = store.begin().await.unwrap();
        tx.set_available_seats(r.id, 10).await.unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.set_available_seats(r.id, 5).await.unwrap();
        }

        let after = store.get_route(r.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 40);
    }

    #[tokio::test]
    async fn test_seat_bounds_enforced() {
        let store = MemoryStore::new();
        let r = route(40);
        store.insert_route(r.clone()).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.set_available_seats(r.id, -1).await.is_err());
        assert!(tx.set_available_seats(r.id, 41).await.is_err());
        assert!(tx.set_available_seats(Uuid::new_v4(), 1).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let store = MemoryStore::new();
        let new_user = NewUser {
            username: "rahim".to_string(),
            email: "rahim@example.com".to_string(),
            full_name: "Rahim Uddin".to_string(),
            phone: None,
            password_hash: "hash".to_string(),
        };

        store.create_user(new_user.clone()).await.unwrap();
        assert!(store.exists("someone", "RAHIM@example.com").await.unwrap());
        assert!(store.create_user(new_user).await.is_err());
        assert!(store.find_by_email(" Rahim@Example.com ").await.unwrap().is_some());
    }
}
