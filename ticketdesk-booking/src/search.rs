use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use ticketdesk_core::{
    BookingError, BookingResult, Route, RouteQuery, RouteRepository, RouteSearchResult,
};

const SUGGESTION_LIMIT: i64 = 5;

pub struct SearchService {
    routes: Arc<dyn RouteRepository>,
}

impl SearchService {
    pub fn new(routes: Arc<dyn RouteRepository>) -> Self {
        Self { routes }
    }

    /// Matching routes, or looser suggestions when nothing matches.
    pub async fn search(&self, query: &RouteQuery) -> BookingResult<RouteSearchResult> {
        if query.passengers < 1 {
            return Err(BookingError::InvalidPassengerCount(format!(
                "search needs at least one passenger, got {}",
                query.passengers
            )));
        }

        let routes = self
            .routes
            .search_routes(query)
            .await
            .map_err(BookingError::TransactionFailed)?;

        let suggestions = if routes.is_empty() {
            self.routes
                .suggest_routes(query, SUGGESTION_LIMIT)
                .await
                .map_err(BookingError::TransactionFailed)?
        } else {
            Vec::new()
        };

        debug!(
            "Search {} -> {}: {} routes, {} suggestions",
            query.departure,
            query.arrival,
            routes.len(),
            suggestions.len()
        );

        Ok(RouteSearchResult { routes, suggestions })
    }

    pub async fn get_route(&self, route_id: Uuid) -> BookingResult<Route> {
        self.routes
            .get_route(route_id)
            .await
            .map_err(BookingError::TransactionFailed)?
            .ok_or_else(|| BookingError::not_found("route", route_id))
    }
}
