use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SEAT_CAPACITY: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub seat_capacity: i32,
    pub available_seats: i32,
}

impl Flight {
    pub fn new(flight_number: String, departure_time: DateTime<Utc>) -> Self {
        Self::with_capacity(flight_number, departure_time, DEFAULT_SEAT_CAPACITY)
    }

    pub fn with_capacity(
        flight_number: String,
        departure_time: DateTime<Utc>,
        seat_capacity: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_number,
            departure_time,
            seat_capacity,
            available_seats: seat_capacity,
        }
    }

    pub fn seats_booked(&self) -> i32 {
        self.seat_capacity - self.available_seats
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }
}
