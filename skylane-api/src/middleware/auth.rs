use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use skylane_domain::SessionPrincipal;

// ============================================================================
// Session Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub jti: String,
    pub exp: usize,
}

/// Authenticated principal injected into request extensions. `is_admin`
/// comes from the user record loaded on this request, not from the token,
/// so demoting an admin takes effect on their next request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub token_id: String,
    pub token_exp: usize,
}

impl SessionPrincipal for CurrentUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn session_id(&self) -> String {
        self.token_id.clone()
    }
}

// ============================================================================
// Session Middleware
// ============================================================================

pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::AuthenticationError("Missing credentials".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::AuthenticationError("Missing credentials".to_string()))?;

    // 2. Decode and validate the token
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::AuthenticationError("Invalid or expired session".to_string()))?;

    let claims = token_data.claims;

    // 3. Reject revoked sessions; fail open if the denylist is unreachable
    match state.redis.is_session_revoked(&claims.jti).await {
        Ok(true) => {
            return Err(ApiError::AuthenticationError(
                "Session has been revoked".to_string(),
            ))
        }
        Ok(false) => {}
        Err(e) => tracing::warn!("Revocation check unavailable, allowing request: {}", e),
    }

    // 4. Map the session-stored id back to a live user record
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::AuthenticationError("Invalid or expired session".to_string()))?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::AuthenticationError("Invalid or expired session".to_string()))?;

    // 5. Inject the principal into request extensions
    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
        token_id: claims.jti,
        token_exp: claims.exp,
    });

    Ok(next.run(req).await)
}
