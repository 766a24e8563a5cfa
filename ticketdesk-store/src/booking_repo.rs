use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use ticketdesk_core::{
    Booking, BookingRepository, BookingStatus, PageRequest, Payment, Route, StoreError,
    StoreTransaction, UnitOfWork,
};
use crate::route_repo::{RouteRow, ROUTE_COLUMNS};

const BOOKING_COLUMNS: &str = "id, user_id, route_id, passengers, total_amount, status, seat_numbers, booking_date";
const PAYMENT_COLUMNS: &str = "id, booking_id, amount, method, transaction_id, status, updated_at";

/// Booking and payment rows, plus the transaction entry point for the core.
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    route_id: Uuid,
    passengers: i32,
    total_amount: i64,
    status: String,
    seat_numbers: Option<String>,
    booking_date: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            route_id: row.route_id,
            passengers: row.passengers,
            total_amount: row.total_amount,
            status: row.status.parse::<BookingStatus>()?,
            seat_numbers: row.seat_numbers,
            booking_date: row.booking_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount: i64,
    method: String,
    transaction_id: Option<String>,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            method: row.method,
            transaction_id: row.transaction_id,
            status: row.status.parse()?,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn get_payment(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("SELECT {} FROM payments WHERE booking_id = $1", PAYMENT_COLUMNS))
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC LIMIT $2 OFFSET $3",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn count_bookings(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl UnitOfWork for PgBookingRepository {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

/// Row locks are taken with `FOR UPDATE`; sqlx rolls the transaction back if
/// it is dropped before `commit`.
pub struct PgStoreTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn lock_route(&mut self, route_id: Uuid) -> Result<Option<Route>, StoreError> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM routes WHERE id = $1 FOR UPDATE", ROUTE_COLUMNS))
            .bind(route_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Route::from))
    }

    async fn set_available_seats(&mut self, route_id: Uuid, available_seats: i32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE routes SET available_seats = $1 WHERE id = $2")
            .bind(available_seats)
            .bind(route_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(format!("route {} vanished during update", route_id).into());
        }
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, route_id, passengers, total_amount, status, seat_numbers, booking_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.route_id)
        .bind(booking.passengers)
        .bind(booking.total_amount)
        .bind(booking.status.as_str())
        .bind(booking.seat_numbers.as_deref())
        .bind(booking.booking_date)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1 FOR UPDATE", BOOKING_COLUMNS))
            .bind(booking_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, amount, method, transaction_id, status, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(payment.transaction_id.as_deref())
        .bind(payment.status.as_str())
        .bind(payment.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn lock_payment(&mut self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("SELECT {} FROM payments WHERE booking_id = $1 FOR UPDATE", PAYMENT_COLUMNS))
            .bind(booking_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query("UPDATE payments SET method = $1, transaction_id = $2, status = $3, updated_at = $4 WHERE id = $5")
            .bind(&payment.method)
            .bind(payment.transaction_id.as_deref())
            .bind(payment.status.as_str())
            .bind(payment.updated_at)
            .bind(payment.id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
