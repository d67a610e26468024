use axum::{extract::State, Extension, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use skylane_domain::DomainError;

/// Admin-only overview. The gate is a pure attribute check on the
/// authenticated user; there are no admin mutation operations.
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !user.is_admin {
        return Err(DomainError::Unauthorized.into());
    }

    let users = state.users.count().await?;
    let flights = state.flights.count().await?;
    let bookings = state.bookings.count().await?;

    Ok(Json(json!({
        "users": users,
        "flights": flights,
        "bookings": bookings,
    })))
}
