use std::sync::Arc;

use skylane_domain::credentials::CredentialService;
use skylane_domain::repository::{BookingRepository, FlightRepository, UserRepository};
use skylane_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct RateLimit {
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub users: Arc<dyn UserRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimit,
}
