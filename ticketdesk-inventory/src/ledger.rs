use std::sync::Arc;
use serde::Serialize;
use uuid::Uuid;
use tracing::{info, warn};
use ticketdesk_core::{discard, BookingError, BookingResult, StoreTransaction, UnitOfWork};

/// Seats taken from a route by one reservation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SeatReservation {
    pub route_id: Uuid,
    pub seats: i32,
    /// First position of the contiguous seat block, 1-based.
    pub first_seat: i32,
    pub available_after: i32,
    /// Route price read under the same lock as the seat count.
    pub unit_price: i64,
}

impl SeatReservation {
    /// Default seat labels for the reserved block, e.g. "S3, S4".
    pub fn seat_labels(&self) -> String {
        (self.first_seat..self.first_seat + self.seats)
            .map(|n| format!("S{}", n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SeatRelease {
    pub route_id: Uuid,
    pub seats: i32,
    pub available_after: i32,
    /// True when the release would have exceeded capacity and was capped.
    pub clamped: bool,
}

/// Seat count after reserving `requested` seats, and the first seat of the block.
pub fn seats_after_reserve(available: i32, capacity: i32, requested: i32) -> BookingResult<(i32, i32)> {
    if requested <= 0 {
        return Err(BookingError::InvalidPassengerCount(format!(
            "cannot reserve {} seats",
            requested
        )));
    }

    if requested > available {
        return Err(BookingError::InsufficientSeats {
            requested,
            available,
        });
    }

    let first_seat = (capacity - available).max(0) + 1;
    Ok((available - requested, first_seat))
}

/// Seat count after returning `released` seats, capped at capacity.
pub fn seats_after_release(available: i32, capacity: i32, released: i32) -> BookingResult<(i32, bool)> {
    if released <= 0 {
        return Err(BookingError::InvalidPassengerCount(format!(
            "cannot release {} seats",
            released
        )));
    }

    let restored = available.saturating_add(released);
    if restored > capacity {
        Ok((capacity, true))
    } else {
        Ok((restored, false))
    }
}

/// Owns every mutation of `available_seats`.
///
/// `reserve_in`/`release_in` enlist in a caller's transaction so the seat change
/// commits or rolls back together with the booking and payment writes.
/// `reserve`/`release` run in a transaction of their own.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn UnitOfWork>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn UnitOfWork>) -> Self {
        Self { store }
    }

    pub async fn reserve_in(
        &self,
        tx: &mut dyn StoreTransaction,
        route_id: Uuid,
        seats: i32,
    ) -> BookingResult<SeatReservation> {
        let route = tx
            .lock_route(route_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .ok_or_else(|| BookingError::not_found("route", route_id))?;

        let (available_after, first_seat) = seats_after_reserve(route.available_seats, route.capacity, seats)?;

        tx.set_available_seats(route_id, available_after)
            .await
            .map_err(BookingError::TransactionFailed)?;

        Ok(SeatReservation {
            route_id,
            seats,
            first_seat,
            available_after,
            unit_price: route.price,
        })
    }

    pub async fn release_in(
        &self,
        tx: &mut dyn StoreTransaction,
        route_id: Uuid,
        seats: i32,
    ) -> BookingResult<SeatRelease> {
        let route = tx
            .lock_route(route_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .ok_or_else(|| BookingError::not_found("route", route_id))?;

        let (available_after, clamped) = seats_after_release(route.available_seats, route.capacity, seats)?;
        if clamped {
            warn!(
                "Release of {} seats on route {} exceeds capacity {}, capping",
                seats, route_id, route.capacity
            );
        }

        tx.set_available_seats(route_id, available_after)
            .await
            .map_err(BookingError::TransactionFailed)?;

        Ok(SeatRelease {
            route_id,
            seats,
            available_after,
            clamped,
        })
    }

    pub async fn reserve(&self, route_id: Uuid, seats: i32) -> BookingResult<SeatReservation> {
        let mut tx = self.store.begin().await.map_err(BookingError::TransactionFailed)?;

        match self.reserve_in(tx.as_mut(), route_id, seats).await {
            Ok(reservation) => {
                tx.commit().await.map_err(BookingError::TransactionFailed)?;
                info!("Reserved {} seats on route {}", seats, route_id);
                Ok(reservation)
            }
            Err(e) => {
                discard(tx).await;
                Err(e)
            }
        }
    }

    pub async fn release(&self, route_id: Uuid, seats: i32) -> BookingResult<SeatRelease> {
        let mut tx = self.store.begin().await.map_err(BookingError::TransactionFailed)?;

        match self.release_in(tx.as_mut(), route_id, seats).await {
            Ok(release) => {
                tx.commit().await.map_err(BookingError::TransactionFailed)?;
                info!("Released {} seats on route {}", seats, route_id);
                Ok(release)
            }
            Err(e) => {
                discard(tx).await;
                Err(e)
            }
        }
    }
}
