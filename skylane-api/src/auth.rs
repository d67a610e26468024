use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::{CurrentUser, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SignupRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .credentials
        .register(&req.username, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created successfully!",
            "user": user.public(),
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    // A single generic error for unknown user and wrong password.
    let user = state
        .credentials
        .verify(&req.username, &req.password)
        .await?;

    let claims = SessionClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: if user.is_admin { "ADMIN" } else { "USER" }.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(anyhow::anyhow!("Token encoding failed: {}", e)))?;

    info!(username = %user.username, "session started");
    Ok(Json(AuthResponse { token }))
}

/// Revokes the presented token for the rest of its lifetime.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let remaining = (user.token_exp as i64 - Utc::now().timestamp()).max(1) as u64;

    state
        .redis
        .revoke_session(&user.token_id, remaining)
        .await
        .map_err(ApiError::internal)?;

    info!(username = %user.username, "session ended");
    Ok(Json(json!({ "message": "Logged out." })))
}
