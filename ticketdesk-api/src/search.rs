use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use ticketdesk_core::{Route, RouteQuery, RouteSearchResult};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub transport_type: Option<String>,
    pub passengers: Option<i32>,
}

impl From<SearchParams> for RouteQuery {
    fn from(params: SearchParams) -> Self {
        RouteQuery {
            departure: params.from,
            arrival: params.to,
            date: params.date,
            transport_type: params
                .transport_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            passengers: params.passengers.unwrap_or(1),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/routes/search", get(search_routes))
        .route("/v1/routes/{id}", get(get_route))
}

async fn search_routes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<RouteSearchResult>, AppError> {
    let query = RouteQuery::from(params);
    Ok(Json(state.search.search(&query).await?))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    Ok(Json(state.search.get_route(id).await?))
}
