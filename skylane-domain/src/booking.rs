use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join record linking a user to a flight. Immutable once created; there is
/// no cancellation path, so bookings are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub booking_time: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, flight_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            flight_id,
            booking_time: Utc::now(),
        }
    }
}
