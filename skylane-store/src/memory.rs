use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use skylane_domain::booking::Booking;
use skylane_domain::error::DomainError;
use skylane_domain::flight::Flight;
use skylane_domain::repository::{BookingRepository, FlightRepository, UserRepository};
use skylane_domain::user::User;

/// In-memory store used by tests and local development.
///
/// One mutex guards all three tables, so the booking transaction's
/// check-decrement-insert runs under a single guard and concurrent bookings
/// serialize exactly as they do behind the database's conditional update.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    flights: HashMap<Uuid, Flight>,
    bookings: Vec<Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seeding helper. Admin accounts have no signup path; an operator
    /// flips the flag out of band, which this stands in for.
    pub async fn promote_to_admin(&self, username: &str) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or(DomainError::InvalidCredentials)?;
        user.is_admin = true;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::DuplicateUsername);
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::InvalidCredentials)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn count(&self) -> Result<i64, DomainError> {
        Ok(self.inner.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn add_flight(&self, flight: &Flight) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;
        if inner
            .flights
            .values()
            .any(|f| f.flight_number == flight.flight_number)
        {
            return Err(DomainError::validation("Flight number already exists"));
        }
        inner.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn find_by_departure_time(
        &self,
        departure_time: DateTime<Utc>,
    ) -> Result<Vec<Flight>, DomainError> {
        let inner = self.inner.lock().await;
        let mut flights: Vec<Flight> = inner
            .flights
            .values()
            .filter(|f| f.departure_time == departure_time)
            .cloned()
            .collect();
        flights.sort_by(|a, b| a.flight_number.cmp(&b.flight_number));
        Ok(flights)
    }

    async fn find_on_day(&self, day: NaiveDate) -> Result<Vec<Flight>, DomainError> {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);

        let inner = self.inner.lock().await;
        let mut flights: Vec<Flight> = inner
            .flights
            .values()
            .filter(|f| f.departure_time >= start && f.departure_time < end)
            .cloned()
            .collect();
        flights.sort_by(|a, b| {
            (a.departure_time, &a.flight_number).cmp(&(b.departure_time, &b.flight_number))
        });
        Ok(flights)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Flight>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner.flights.get(&id).cloned())
    }

    async fn count(&self) -> Result<i64, DomainError> {
        Ok(self.inner.lock().await.flights.len() as i64)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn book(&self, user_id: Uuid, flight_id: Uuid) -> Result<Booking, DomainError> {
        // Check, decrement and insert under one guard.
        let mut inner = self.inner.lock().await;

        let flight = inner
            .flights
            .get_mut(&flight_id)
            .ok_or(DomainError::FlightNotFound)?;

        if flight.available_seats == 0 {
            return Err(DomainError::NoSeatsAvailable);
        }

        flight.available_seats -= 1;
        let booking = Booking::new(user_id, flight_id);
        inner.bookings.push(booking.clone());

        Ok(booking)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.booking_time);
        Ok(bookings)
    }

    async fn count(&self) -> Result<i64, DomainError> {
        Ok(self.inner.lock().await.bookings.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn departure(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    async fn seed_flight(store: &MemoryStore, number: &str, seats: i32) -> Uuid {
        let flight = Flight::with_capacity(number.to_string(), departure(10, 0), seats);
        let id = flight.id;
        store.add_flight(&flight).await.unwrap();
        id
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn last_seat_goes_to_exactly_one_of_two_concurrent_bookings() {
        let store = Arc::new(MemoryStore::new());
        let flight_id = seed_flight(&store, "SK101", 1).await;

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let s1 = store.clone();
        let s2 = store.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.book(alice, flight_id).await }),
            tokio::spawn(async move { s2.book(bob, flight_id).await }),
        );
        let (r1, r2) = (r1.unwrap(), r2.unwrap());

        assert_eq!(r1.is_ok() as u8 + r2.is_ok() as u8, 1);
        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(loser.unwrap_err(), DomainError::NoSeatsAvailable));

        let flight = FlightRepository::find_by_id(&*store, flight_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flight.available_seats, 0);
        assert_eq!(BookingRepository::count(&*store).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn capacity_is_never_oversold_under_load() {
        let capacity = 5;
        let attempts = 20;

        let store = Arc::new(MemoryStore::new());
        let flight_id = seed_flight(&store, "SK102", capacity).await;

        let mut handles = Vec::new();
        for _ in 0..attempts {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.book(Uuid::new_v4(), flight_id).await
            }));
        }

        let mut booked = 0;
        let mut sold_out = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(DomainError::NoSeatsAvailable) => sold_out += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(booked, capacity);
        assert_eq!(sold_out, attempts - capacity);

        // Every decrement has a matching booking row and vice versa.
        let flight = FlightRepository::find_by_id(&*store, flight_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flight.available_seats, 0);
        assert_eq!(
            BookingRepository::count(&*store).await.unwrap(),
            (flight.seat_capacity - flight.available_seats) as i64
        );
    }

    #[tokio::test]
    async fn booking_an_unknown_flight_mutates_nothing() {
        let store = MemoryStore::new();
        seed_flight(&store, "SK103", 3).await;

        let err = store.book(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::FlightNotFound));

        assert_eq!(BookingRepository::count(&store).await.unwrap(), 0);
        let flights = store.find_on_day(departure(10, 0).date_naive()).await.unwrap();
        assert_eq!(flights[0].available_seats, 3);
    }

    #[tokio::test]
    async fn departure_search_matches_exact_instants_only() {
        let store = MemoryStore::new();
        let at_ten = Flight::new("SK110".to_string(), departure(10, 0));
        let near_ten = Flight::new("SK111".to_string(), departure(10, 30));
        store.add_flight(&at_ten).await.unwrap();
        store.add_flight(&near_ten).await.unwrap();

        let found = store.find_by_departure_time(departure(10, 0)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].flight_number, "SK110");

        let day = store.find_on_day(departure(10, 0).date_naive()).await.unwrap();
        assert_eq!(day.len(), 2);
        assert!(store
            .find_on_day(departure(10, 0).date_naive().succ_opt().unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn bookings_list_is_per_user_and_ascending() {
        let store = MemoryStore::new();
        let flight_id = seed_flight(&store, "SK120", 10).await;

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.book(alice, flight_id).await.unwrap();
        store.book(bob, flight_id).await.unwrap();
        store.book(alice, flight_id).await.unwrap();

        let bookings = store.list_by_user(alice).await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert!(bookings.iter().all(|b| b.user_id == alice));
        assert!(bookings[0].booking_time <= bookings[1].booking_time);
    }

    #[tokio::test]
    async fn duplicate_flight_numbers_are_rejected() {
        let store = MemoryStore::new();
        seed_flight(&store, "SK130", 10).await;

        let dup = Flight::new("SK130".to_string(), departure(12, 0));
        assert!(matches!(
            store.add_flight(&dup).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }
}
