use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use ticketdesk_core::{Route, RouteQuery, RouteRepository, StoreError};
use crate::database::like_pattern;

pub(crate) const ROUTE_COLUMNS: &str = "id, departure_city, arrival_city, departure_time, arrival_time, \
     transport_type, vehicle_name, vehicle_number, price, capacity, available_seats";

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seeds a route. Existing rows are left alone so restarts keep seat counts.
    pub async fn insert_route_if_absent(&self, route: &Route) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO routes (id, departure_city, arrival_city, departure_time, arrival_time,
                                transport_type, vehicle_name, vehicle_number, price, capacity, available_seats)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(route.id)
        .bind(&route.departure_city)
        .bind(&route.arrival_city)
        .bind(route.departure_time)
        .bind(route.arrival_time)
        .bind(&route.transport_type)
        .bind(&route.vehicle_name)
        .bind(&route.vehicle_number)
        .bind(route.price)
        .bind(route.capacity)
        .bind(route.available_seats)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RouteRow {
    id: Uuid,
    departure_city: String,
    arrival_city: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    transport_type: String,
    vehicle_name: String,
    vehicle_number: String,
    price: i64,
    capacity: i32,
    available_seats: i32,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            departure_city: row.departure_city,
            arrival_city: row.arrival_city,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            transport_type: row.transport_type,
            vehicle_name: row.vehicle_name,
            vehicle_number: row.vehicle_number,
            price: row.price,
            capacity: row.capacity,
            available_seats: row.available_seats,
        }
    }
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, StoreError> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM routes WHERE id = $1", ROUTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Route::from))
    }

    async fn search_routes(&self, query: &RouteQuery) -> Result<Vec<Route>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM routes
            WHERE departure_city ILIKE $1
              AND arrival_city ILIKE $2
              AND ($3::date IS NULL OR (departure_time AT TIME ZONE 'UTC')::date = $3)
              AND ($4::text IS NULL OR lower(transport_type) = lower($4))
              AND available_seats >= $5
            ORDER BY departure_time
            "#,
            ROUTE_COLUMNS
        );

        let transport_type = query
            .transport_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let rows = sqlx::query_as::<_, RouteRow>(&sql)
            .bind(like_pattern(&query.departure))
            .bind(like_pattern(&query.arrival))
            .bind(query.date)
            .bind(transport_type)
            .bind(query.passengers)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn suggest_routes(&self, query: &RouteQuery, limit: i64) -> Result<Vec<Route>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM routes
            WHERE departure_city ILIKE $1 OR arrival_city ILIKE $2
            ORDER BY departure_time
            LIMIT $3
            "#,
            ROUTE_COLUMNS
        );

        let rows = sqlx::query_as::<_, RouteRow>(&sql)
            .bind(like_pattern(&query.departure))
            .bind(like_pattern(&query.arrival))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }
}
