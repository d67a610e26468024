use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skylane_domain::booking::Booking;
use skylane_domain::error::DomainError;
use skylane_domain::flight::Flight;
use skylane_domain::repository::{BookingRepository, FlightRepository, UserRepository};
use skylane_domain::user::User;

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    departure_time: DateTime<Utc>,
    seat_capacity: i32,
    available_seats: i32,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            flight_number: row.flight_number,
            departure_time: row.departure_time,
            seat_capacity: row.seat_capacity,
            available_seats: row.available_seats,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    booking_time: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            flight_id: row.flight_id,
            booking_time: row.booking_time,
        }
    }
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Err(DomainError::DuplicateUsername)
            }
            Err(e) => Err(DomainError::storage(e)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, is_admin, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(DomainError::storage)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, is_admin, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(DomainError::storage)
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(DomainError::storage)
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::storage)
    }
}

pub struct PostgresFlightRepository {
    pool: PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn add_flight(&self, flight: &Flight) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO flights (id, flight_number, departure_time, seat_capacity, available_seats) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(flight.departure_time)
        .bind(flight.seat_capacity)
        .bind(flight.available_seats)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(DomainError::storage)
    }

    async fn find_by_departure_time(
        &self,
        departure_time: DateTime<Utc>,
    ) -> Result<Vec<Flight>, DomainError> {
        sqlx::query_as::<_, FlightRow>(
            "SELECT id, flight_number, departure_time, seat_capacity, available_seats \
             FROM flights WHERE departure_time = $1 ORDER BY flight_number",
        )
        .bind(departure_time)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Flight::from).collect())
        .map_err(DomainError::storage)
    }

    async fn find_on_day(&self, day: NaiveDate) -> Result<Vec<Flight>, DomainError> {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);

        sqlx::query_as::<_, FlightRow>(
            "SELECT id, flight_number, departure_time, seat_capacity, available_seats \
             FROM flights WHERE departure_time >= $1 AND departure_time < $2 \
             ORDER BY departure_time, flight_number",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Flight::from).collect())
        .map_err(DomainError::storage)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Flight>, DomainError> {
        sqlx::query_as::<_, FlightRow>(
            "SELECT id, flight_number, departure_time, seat_capacity, available_seats \
             FROM flights WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Flight::from))
        .map_err(DomainError::storage)
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM flights")
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::storage)
    }
}

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn book(&self, user_id: Uuid, flight_id: Uuid) -> Result<Booking, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        // Conditional decrement; the row count tells us whether a seat was
        // actually taken. Two concurrent bookings on the last seat serialize
        // here, and only one sees an affected row.
        let updated = sqlx::query(
            "UPDATE flights SET available_seats = available_seats - 1 \
             WHERE id = $1 AND available_seats > 0",
        )
        .bind(flight_id)
        .execute(&mut *tx)
        .await
        .map_err(DomainError::storage)?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM flights WHERE id = $1")
                .bind(flight_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DomainError::storage)?;

            tx.rollback().await.map_err(DomainError::storage)?;

            return Err(if exists.is_some() {
                DomainError::NoSeatsAvailable
            } else {
                DomainError::FlightNotFound
            });
        }

        let booking = Booking::new(user_id, flight_id);
        sqlx::query(
            "INSERT INTO bookings (id, user_id, flight_id, booking_time) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(booking.booking_time)
        .execute(&mut *tx)
        .await
        .map_err(DomainError::storage)?;

        // Decrement and insert commit together or not at all.
        tx.commit().await.map_err(DomainError::storage)?;

        Ok(booking)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError> {
        sqlx::query_as::<_, BookingRow>(
            "SELECT id, user_id, flight_id, booking_time \
             FROM bookings WHERE user_id = $1 ORDER BY booking_time ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Booking::from).collect())
        .map_err(DomainError::storage)
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::storage)
    }
}
