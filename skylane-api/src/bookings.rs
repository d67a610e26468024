use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookFlightForm {
    pub flight_id: Uuid,
}

pub async fn book_flight(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<BookFlightForm>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.bookings.book(user.id, form.flight_id).await?;

    info!(booking_id = %booking.id, flight_id = %form.flight_id, "Booking confirmed");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Flight booked successfully!",
            "booking": booking,
        })),
    ))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bookings = state.bookings.list_by_user(user.id).await?;
    Ok(Json(json!({ "bookings": bookings })))
}
