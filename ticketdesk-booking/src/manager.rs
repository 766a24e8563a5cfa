use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use ticketdesk_core::{
    discard, Booking, BookingDetails, BookingError, BookingRepository, BookingResult, BookingStatus,
    CreateBookingRequest, PageRequest, Paginated, PassengerDetail, Payment, Route,
    RouteRepository, SessionContext, StoreTransaction, UnitOfWork,
};
use ticketdesk_inventory::{InventoryLedger, SeatRelease, SeatReservation};

/// Business rules applied by the booking lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// Cancellation is refused once fewer whole hours than this remain before departure.
    pub cancellation_cutoff_hours: i64,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            cancellation_cutoff_hours: 3,
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

impl BookingPolicy {
    pub fn page_request(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        PageRequest::new(page.unwrap_or(1), per_page.unwrap_or(self.default_page_size))
            .clamp_per_page(self.max_page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationReceipt {
    pub booking: Booking,
    pub payment: Option<Payment>,
    pub seats_released: SeatRelease,
}

/// Drives a booking through `CONFIRMED -> CANCELLED`, keeping the seat count,
/// the booking row and its payment consistent.
pub struct BookingManager {
    store: Arc<dyn UnitOfWork>,
    routes: Arc<dyn RouteRepository>,
    bookings: Arc<dyn BookingRepository>,
    ledger: InventoryLedger,
    policy: BookingPolicy,
}

impl BookingManager {
    pub fn new(
        store: Arc<dyn UnitOfWork>,
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        policy: BookingPolicy,
    ) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        Self {
            store,
            routes,
            bookings,
            ledger,
            policy,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Reserve seats and record the booking with a pending payment, all or nothing.
    pub async fn create_booking(&self, ctx: &SessionContext, request: CreateBookingRequest) -> BookingResult<Booking> {
        self.routes
            .get_route(request.route_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .ok_or_else(|| BookingError::not_found("route", request.route_id))?;

        validate_passengers(request.passenger_count, &request.passengers)?;

        let mut tx = self.store.begin().await.map_err(BookingError::TransactionFailed)?;

        let booking = match self.write_booking(tx.as_mut(), ctx, &request).await {
            Ok(booking) => booking,
            Err(e) => {
                discard(tx).await;
                return Err(e);
            }
        };

        tx.commit().await.map_err(BookingError::TransactionFailed)?;

        info!(
            "Booking {} created for user {} on route {} ({} seats, total {})",
            booking.id, ctx.user_id, booking.route_id, booking.passengers, booking.total_amount
        );
        Ok(booking)
    }

    async fn write_booking(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &SessionContext,
        request: &CreateBookingRequest,
    ) -> BookingResult<Booking> {
        let reservation = self
            .ledger
            .reserve_in(tx, request.route_id, request.passenger_count)
            .await?;

        let total_amount = reservation
            .unit_price
            .checked_mul(i64::from(request.passenger_count))
            .ok_or_else(|| {
                BookingError::TransactionFailed(
                    format!(
                        "total for {} seats at {} overflows",
                        request.passenger_count, reservation.unit_price
                    )
                    .into(),
                )
            })?;
        let seat_numbers = seat_numbers(&request.passengers, &reservation);

        let booking = Booking::new(
            ctx.user_id,
            request.route_id,
            request.passenger_count,
            total_amount,
            Some(seat_numbers),
        );
        tx.insert_booking(&booking)
            .await
            .map_err(BookingError::TransactionFailed)?;

        let payment = Payment::pending(booking.id, total_amount);
        tx.insert_payment(&payment)
            .await
            .map_err(BookingError::TransactionFailed)?;

        Ok(booking)
    }

    /// Cancel a booking, refund its payment and return the seats.
    pub async fn cancel_booking(
        &self,
        ctx: &SessionContext,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> BookingResult<CancellationReceipt> {
        let mut tx = self.store.begin().await.map_err(BookingError::CancellationFailed)?;

        let receipt = match self.write_cancellation(tx.as_mut(), ctx, booking_id, now).await {
            Ok(receipt) => receipt,
            Err(e) => {
                discard(tx).await;
                return Err(e);
            }
        };

        tx.commit().await.map_err(BookingError::CancellationFailed)?;

        info!(
            "Booking {} cancelled by user {}, {} seats returned to route {}",
            booking_id, ctx.user_id, receipt.seats_released.seats, receipt.booking.route_id
        );
        Ok(receipt)
    }

    async fn write_cancellation(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &SessionContext,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> BookingResult<CancellationReceipt> {
        let mut booking = tx
            .lock_booking(booking_id)
            .await
            .map_err(BookingError::CancellationFailed)?
            .filter(|b| b.is_owned_by(ctx.user_id))
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;

        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        let mut payment = tx
            .lock_payment(booking_id)
            .await
            .map_err(BookingError::CancellationFailed)?;

        let route = tx
            .lock_route(booking.route_id)
            .await
            .map_err(BookingError::CancellationFailed)?
            .ok_or_else(|| BookingError::not_found("route", booking.route_id))?;

        let hours_until_departure = route.hours_until_departure(now);
        if hours_until_departure < self.policy.cancellation_cutoff_hours {
            return Err(BookingError::CancellationWindowClosed {
                hours_until_departure,
                cutoff_hours: self.policy.cancellation_cutoff_hours,
            });
        }

        tx.update_booking_status(booking_id, BookingStatus::Cancelled)
            .await
            .map_err(BookingError::CancellationFailed)?;
        booking.status = BookingStatus::Cancelled;

        match payment.as_mut() {
            Some(p) if p.status.is_refundable() => {
                p.mark_refunded();
                tx.update_payment(p)
                    .await
                    .map_err(BookingError::CancellationFailed)?;
            }
            Some(_) => {}
            None => warn!("Booking {} has no payment record to refund", booking_id),
        }

        let seats_released = self
            .ledger
            .release_in(tx, booking.route_id, booking.passengers)
            .await
            .map_err(|e| match e {
                BookingError::TransactionFailed(source) => BookingError::CancellationFailed(source),
                other => other,
            })?;

        Ok(CancellationReceipt {
            booking,
            payment,
            seats_released,
        })
    }

    pub async fn get_booking(&self, ctx: &SessionContext, booking_id: Uuid) -> BookingResult<BookingDetails> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .filter(|b| b.is_owned_by(ctx.user_id))
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;

        self.details(booking).await
    }

    /// The caller's bookings, newest first.
    pub async fn list_bookings(&self, ctx: &SessionContext, page: PageRequest) -> BookingResult<Paginated<BookingDetails>> {
        let page = page.clamp_per_page(self.policy.max_page_size);

        let total = self
            .bookings
            .count_bookings(ctx.user_id)
            .await
            .map_err(BookingError::TransactionFailed)?;

        let bookings = self
            .bookings
            .list_bookings(ctx.user_id, page)
            .await
            .map_err(BookingError::TransactionFailed)?;

        let mut items = Vec::with_capacity(bookings.len());
        for booking in bookings {
            items.push(self.details(booking).await?);
        }

        Ok(Paginated {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn details(&self, booking: Booking) -> BookingResult<BookingDetails> {
        let route: Route = self
            .routes
            .get_route(booking.route_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .ok_or_else(|| BookingError::not_found("route", booking.route_id))?;

        let payment = self
            .bookings
            .get_payment(booking.id)
            .await
            .map_err(BookingError::TransactionFailed)?;

        Ok(BookingDetails {
            booking,
            route,
            payment,
        })
    }
}

fn validate_passengers(count: i32, passengers: &[PassengerDetail]) -> BookingResult<()> {
    if count < 1 {
        return Err(BookingError::InvalidPassengerCount(format!(
            "at least one passenger required, got {}",
            count
        )));
    }

    if !passengers.is_empty() && passengers.len() != count as usize {
        return Err(BookingError::InvalidPassengerCount(format!(
            "{} passenger details for {} passengers",
            passengers.len(),
            count
        )));
    }

    Ok(())
}

/// Seats named by the passengers when every one of them picked a seat,
/// otherwise the ledger's block.
fn seat_numbers(passengers: &[PassengerDetail], reservation: &SeatReservation) -> String {
    let chosen: Vec<&str> = passengers
        .iter()
        .filter_map(|p| p.seat_number.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if !passengers.is_empty() && chosen.len() == passengers.len() {
        chosen.join(", ")
    } else {
        reservation.seat_labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(first_seat: i32, seats: i32) -> SeatReservation {
        SeatReservation {
            route_id: Uuid::nil(),
            seats,
            first_seat,
            available_after: 0,
            unit_price: 500,
        }
    }

    fn passenger(name: &str, seat: Option<&str>) -> PassengerDetail {
        PassengerDetail {
            full_name: name.to_string(),
            seat_number: seat.map(str::to_string),
        }
    }

    #[test]
    fn test_passenger_validation() {
        assert!(validate_passengers(2, &[]).is_ok());
        assert!(matches!(validate_passengers(0, &[]), Err(BookingError::InvalidPassengerCount(_))));
        assert!(matches!(
            validate_passengers(2, &[passenger("Karim", None)]),
            Err(BookingError::InvalidPassengerCount(_))
        ));
    }

    #[test]
    fn test_seat_numbers_prefer_passenger_choice() {
        let both = [passenger("Karim", Some("A1")), passenger("Salma", Some(" A2 "))];
        assert_eq!(seat_numbers(&both, &reservation(5, 2)), "A1, A2");

        let partial = [passenger("Karim", Some("A1")), passenger("Salma", None)];
        assert_eq!(seat_numbers(&partial, &reservation(5, 2)), "S5, S6");

        assert_eq!(seat_numbers(&[], &reservation(1, 1)), "S1");
    }

    #[test]
    fn test_page_request_uses_policy() {
        let policy = BookingPolicy::default();
        let page = policy.page_request(None, None);
        assert_eq!((page.page, page.per_page), (1, 10));

        let page = policy.page_request(Some(2), Some(500));
        assert_eq!((page.page, page.per_page), (2, 50));
    }
}
