use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ticketdesk_core::pii::Masked;
use ticketdesk_core::User;

use crate::accounts::NewAccount;
use crate::error::AppError;
use crate::middleware::auth::{CustomerClaims, CUSTOMER_ROLE};
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Masked<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewAccount>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state.accounts.register(req).await?;
    Ok((StatusCode::CREATED, Json(session_for(&state.auth, &user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.accounts.login(&req.email, req.password.expose()).await?;
    Ok(Json(session_for(&state.auth, &user)?))
}

fn session_for(auth: &AuthConfig, user: &User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: issue_token(auth, user)?,
        user_id: user.id,
    })
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = CustomerClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: CUSTOMER_ROLE.to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))
}
