use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::booking::Booking;
use crate::error::DomainError;
use crate::flight::Flight;
use crate::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateUsername` if the username is already present
    /// (case-sensitive exact match).
    async fn insert(&self, user: &User) -> Result<(), DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DomainError>;

    async fn count(&self) -> Result<i64, DomainError>;
}

#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Seeding path; flights have no public creation endpoint.
    async fn add_flight(&self, flight: &Flight) -> Result<(), DomainError>;

    /// Exact-match lookup. Flights merely near the given instant do not
    /// match; callers wanting a whole day use `find_on_day`.
    async fn find_by_departure_time(
        &self,
        departure_time: DateTime<Utc>,
    ) -> Result<Vec<Flight>, DomainError>;

    async fn find_on_day(&self, day: NaiveDate) -> Result<Vec<Flight>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Flight>, DomainError>;

    async fn count(&self) -> Result<i64, DomainError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// The booking transaction. Atomically checks the flight's remaining
    /// seats, decrements by exactly one, and inserts exactly one booking row;
    /// the decrement and the insert commit or fail together. Concurrent
    /// calls on a flight with one seat left must not both succeed.
    ///
    /// Fails with `FlightNotFound` if the flight does not exist and
    /// `NoSeatsAvailable` if it is sold out; neither failure mutates state.
    async fn book(&self, user_id: Uuid, flight_id: Uuid) -> Result<Booking, DomainError>;

    /// Bookings for one user, ascending by booking_time.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError>;

    async fn count(&self) -> Result<i64, DomainError>;
}
