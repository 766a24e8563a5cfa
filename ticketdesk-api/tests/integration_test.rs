use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use ticketdesk_api::{app, AppState, AuthConfig};
use ticketdesk_core::Route;
use ticketdesk_store::app_config::BusinessRules;
use ticketdesk_store::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

async fn test_app() -> (Router, Route) {
    let store = MemoryStore::new();
    let departure = Utc::now() + Duration::days(5);
    let route = Route {
        id: Uuid::new_v4(),
        departure_city: "Dhaka".to_string(),
        arrival_city: "Chittagong".to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::hours(6),
        transport_type: "Train".to_string(),
        vehicle_name: "Subarna Express".to_string(),
        vehicle_number: "702".to_string(),
        price: 500,
        capacity: 40,
        available_seats: 40,
    };
    store.insert_route(route.clone()).await;

    let auth = AuthConfig {
        secret: "integration-secret".to_string(),
        expiration: 3600,
    };
    let state = AppState::in_memory(store, &BusinessRules::default(), auth);
    (app(state), route)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "full_name": "Tanvir Hasan",
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_search_book_pay_cancel() {
    let (app, route) = test_app().await;
    let token = register(&app, "tanvir").await;

    let (status, body) = send(&app, "POST", "/v1/auth/login", None, Some(json!({
        "email": "tanvir@example.com",
        "password": "correct horse",
    })))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = send(&app, "GET", "/v1/routes/search?from=dhaka&to=chitta&passengers=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["routes"][0]["id"], json!(route.id));

    let (status, booking) = send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({
        "route_id": route.id,
        "passenger_count": 2,
    })))
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    assert_eq!(booking["total_amount"], 1000);
    assert_eq!(booking["status"], "confirmed");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (_, detail) = send(&app, "GET", &format!("/v1/routes/{}", route.id), None, None).await;
    assert_eq!(detail["available_seats"], 38);

    let (status, payment) = send(&app, "POST", &format!("/v1/bookings/{}/payment", booking_id), Some(&token), Some(json!({
        "method": "bKash",
        "details": {
            "kind": "mobile_wallet",
            "mobile_number": "01712345678",
            "transaction_id": "9XK2LM",
            "pin": "12345",
        },
    })))
    .await;
    assert_eq!(status, StatusCode::OK, "{}", payment);
    assert_eq!(payment["status"], "success");
    assert_eq!(payment["method"], "bKash");

    let (status, list) = send(&app, "GET", "/v1/bookings?page=1&per_page=5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["payment"]["status"], "success");

    let (status, receipt) = send(&app, "POST", &format!("/v1/bookings/{}/cancel", booking_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", receipt);
    assert_eq!(receipt["booking"]["status"], "cancelled");
    assert_eq!(receipt["payment"]["status"], "refunded");

    let (_, detail) = send(&app, "GET", &format!("/v1/routes/{}", route.id), None, None).await;
    assert_eq!(detail["available_seats"], 40);

    let (status, body) = send(&app, "POST", &format!("/v1/bookings/{}/cancel", booking_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_cancelled");
}

#[tokio::test]
async fn test_bookings_require_a_token() {
    let (app, route) = test_app().await;

    let (status, _) = send(&app, "POST", "/v1/bookings", None, Some(json!({
        "route_id": route.id,
        "passenger_count": 1,
    })))
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_bodies_carry_codes() {
    let (app, route) = test_app().await;
    let token = register(&app, "farzana").await;

    let (status, body) = send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({
        "route_id": route.id,
        "passenger_count": 41,
    })))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "insufficient_seats");

    let (status, body) = send(&app, "GET", &format!("/v1/bookings/{}", Uuid::new_v4()), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(&app, "GET", "/v1/routes/search?from=dhaka&passengers=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_passenger_count");

    let (_, booking) = send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({
        "route_id": route.id,
        "passenger_count": 1,
    })))
    .await;
    let (status, body) = send(&app, "POST", &format!("/v1/bookings/{}/payment", booking["id"].as_str().unwrap()), Some(&token), Some(json!({
        "method": "Nagad",
        "details": {
            "kind": "mobile_wallet",
            "mobile_number": "0123456789",
            "transaction_id": "TX",
            "pin": "12345",
        },
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_payment_details");

    let (status, body) = send(&app, "POST", "/v1/auth/login", None, Some(json!({
        "email": "farzana@example.com",
        "password": "wrong",
    })))
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_payment_methods_are_public() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/v1/payments/methods", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["methods"].as_array().unwrap().len(), 4);
    assert_eq!(body["methods"][3]["method"], "Bank Transfer");
    assert!(body["banks"].as_array().unwrap().iter().any(|b| b == "BRAC Bank"));
}
