use std::net::SocketAddr;
use std::sync::Arc;

use skylane_api::{
    app,
    state::{AppState, AuthConfig, RateLimit},
};
use skylane_domain::credentials::CredentialService;
use skylane_domain::repository::{BookingRepository, FlightRepository, UserRepository};
use skylane_store::{
    DbClient, PostgresBookingRepository, PostgresFlightRepository, PostgresUserRepository,
    RedisClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skylane_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skylane_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skylane API on port {}", config.server.port);

    // Postgres Connection
    let db = DbClient::connect(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to create Redis client");

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(db.pool.clone()));
    let flights: Arc<dyn FlightRepository> =
        Arc::new(PostgresFlightRepository::new(db.pool.clone()));
    let bookings: Arc<dyn BookingRepository> =
        Arc::new(PostgresBookingRepository::new(db.pool.clone()));
    let credentials = Arc::new(
        CredentialService::new(users.clone()).expect("Failed to initialize credential service"),
    );

    let app_state = AppState {
        credentials,
        users,
        flights,
        bookings,
        redis: Arc::new(redis_client),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rate_limit: RateLimit {
            requests: config.business_rules.rate_limit_requests,
            window_seconds: config.business_rules.rate_limit_window_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
