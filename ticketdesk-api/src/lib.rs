use axum::{
    http::Method,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod accounts;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod search;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let customer = Router::new()
        .merge(bookings::routes())
        .merge(payments::booking_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::customer_auth_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(search::routes())
        .merge(payments::routes())
        .merge(customer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
