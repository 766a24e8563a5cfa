#![allow(dead_code)]

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ticketdesk_booking::{BookingManager, BookingPolicy, PaymentManager};
use ticketdesk_core::{
    Booking, BookingStatus, Payment, Route, RouteRepository, SessionContext, StoreError,
    StoreTransaction, UnitOfWork,
};
use ticketdesk_store::MemoryStore;
use uuid::Uuid;

pub fn route_departing(departure: DateTime<Utc>, price: i64, capacity: i32) -> Route {
    Route {
        id: Uuid::new_v4(),
        departure_city: "Dhaka".to_string(),
        arrival_city: "Chittagong".to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::hours(6),
        transport_type: "Bus".to_string(),
        vehicle_name: "Green Line".to_string(),
        vehicle_number: "GL-2201".to_string(),
        price,
        capacity,
        available_seats: capacity,
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub bookings: BookingManager,
    pub payments: PaymentManager,
    pub ctx: SessionContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Managers over `store`, with transactions opened through `uow`.
    pub fn over(store: MemoryStore, uow: Arc<dyn UnitOfWork>) -> Self {
        let bookings = BookingManager::new(
            uow.clone(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            BookingPolicy::default(),
        );
        let payments = PaymentManager::new(uow);
        Self {
            store,
            bookings,
            payments,
            ctx: SessionContext::new(Uuid::new_v4()),
        }
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let uow: Arc<dyn UnitOfWork> = Arc::new(store.clone());
        Self::over(store, uow)
    }

    pub async fn add_route(&self, route: Route) -> Uuid {
        let id = route.id;
        self.store.insert_route(route).await;
        id
    }

    pub async fn available(&self, route_id: Uuid) -> i32 {
        self.store.get_route(route_id).await.unwrap().unwrap().available_seats
    }
}

/// Delegates to the memory store but fails every payment insert.
pub struct FailingPaymentStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl UnitOfWork for FailingPaymentStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingPaymentTransaction { inner }))
    }
}

struct FailingPaymentTransaction {
    inner: Box<dyn StoreTransaction>,
}

#[async_trait]
impl StoreTransaction for FailingPaymentTransaction {
    async fn lock_route(&mut self, route_id: Uuid) -> Result<Option<Route>, StoreError> {
        self.inner.lock_route(route_id).await
    }

    async fn set_available_seats(&mut self, route_id: Uuid, available_seats: i32) -> Result<(), StoreError> {
        self.inner.set_available_seats(route_id, available_seats).await
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        self.inner.insert_booking(booking).await
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.inner.lock_booking(booking_id).await
    }

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> Result<(), StoreError> {
        self.inner.update_booking_status(booking_id, status).await
    }

    async fn insert_payment(&mut self, _payment: &Payment) -> Result<(), StoreError> {
        Err("payments table unavailable".into())
    }

    async fn lock_payment(&mut self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        self.inner.lock_payment(booking_id).await
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        self.inner.update_payment(payment).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}
