use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use skylane_domain::{DomainError, Flight};

/// Either `departure_time` (exact instant, `YYYY-MM-DDTHH:MM`) or `date`
/// (whole day, `YYYY-MM-DD`). The exact form matches equal timestamps only.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub departure_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
struct FlightSummary {
    id: Uuid,
    flight_number: String,
    departure_time: DateTime<Utc>,
    available_seats: i32,
}

impl From<Flight> for FlightSummary {
    fn from(flight: Flight) -> Self {
        Self {
            id: flight.id,
            flight_number: flight.flight_number,
            departure_time: flight.departure_time,
            available_seats: flight.available_seats,
        }
    }
}

pub async fn search_flights_get(
    State(state): State<AppState>,
    Query(req): Query<SearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    run_search(&state, req).await
}

pub async fn search_flights_post(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    run_search(&state, req).await
}

async fn run_search(
    state: &AppState,
    req: SearchRequest,
) -> Result<Json<serde_json::Value>, ApiError> {
    let flights = if let Some(raw) = req.departure_time {
        state
            .flights
            .find_by_departure_time(parse_departure_time(&raw)?)
            .await?
    } else if let Some(raw) = req.date {
        let day = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| DomainError::validation("date must be formatted YYYY-MM-DD"))?;
        state.flights.find_on_day(day).await?
    } else {
        return Err(DomainError::validation("departure_time or date is required").into());
    };

    let flights: Vec<FlightSummary> = flights.into_iter().map(FlightSummary::from).collect();
    Ok(Json(json!({ "flights": flights })))
}

fn parse_departure_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            DomainError::validation("departure_time must be formatted YYYY-MM-DDTHH:MM").into()
        })
}
