use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use skylane_api::{
    app,
    state::{AppState, AuthConfig, RateLimit},
};
use skylane_domain::credentials::CredentialService;
use skylane_domain::flight::Flight;
use skylane_domain::repository::{BookingRepository, FlightRepository, UserRepository};
use skylane_store::{MemoryStore, RedisClient};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

async fn build_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let users: Arc<dyn UserRepository> = store.clone();
    let flights: Arc<dyn FlightRepository> = store.clone();
    let bookings: Arc<dyn BookingRepository> = store.clone();
    let credentials = Arc::new(CredentialService::new(users.clone()).unwrap());
    let redis = Arc::new(RedisClient::new("redis://127.0.0.1:6379").await.unwrap());

    let state = AppState {
        credentials,
        users,
        flights,
        bookings,
        redis,
        auth: AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        },
        rate_limit: RateLimit {
            requests: 10_000,
            window_seconds: 60,
        },
    };

    TestApp {
        router: app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 3000)))),
        store,
    }
}

fn departure(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

async fn seed_flight(store: &MemoryStore, number: &str, at: DateTime<Utc>, seats: i32) -> Uuid {
    let flight = Flight::with_capacity(number.to_string(), at, seats);
    let id = flight.id;
    store.add_flight(&flight).await.unwrap();
    id
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn form_request(uri: &str, token: Option<&str>, form_body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(form_body)).unwrap()
}

async fn signup(router: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        router,
        json_request(
            "/signup",
            None,
            &json!({ "username": username, "password": password }),
        ),
    )
    .await
}

async fn login_token(router: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            "/login",
            None,
            &json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn landing_page_is_open() {
    let app = build_app().await;
    let (status, body) = send(&app.router, get_request("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "skylane");
}

#[tokio::test]
async fn signup_login_search_book_and_list_flow() {
    let app = build_app().await;
    let flight_id = seed_flight(&app.store, "SK101", departure(10, 0), 2).await;

    let (status, body) = signup(&app.router, "alice", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Account created successfully!");
    assert!(body["user"].get("password_hash").is_none());

    let token = login_token(&app.router, "alice", "pw1").await;

    let (status, body) = send(
        &app.router,
        get_request("/search_flights?departure_time=2024-06-01T10:00", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let flights = body["flights"].as_array().unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["flight_number"], "SK101");
    assert_eq!(flights[0]["available_seats"], 2);

    let (status, body) = send(
        &app.router,
        form_request(
            "/book_flight",
            Some(&token),
            format!("flight_id={flight_id}"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Flight booked successfully!");
    assert_eq!(body["booking"]["flight_id"], flight_id.to_string());

    let (status, body) = send(&app.router, get_request("/my_bookings", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["flight_id"], flight_id.to_string());

    // The booked seat is gone from subsequent searches.
    let (_, body) = send(
        &app.router,
        get_request("/search_flights?departure_time=2024-06-01T10:00", Some(&token)),
    )
    .await;
    assert_eq!(body["flights"][0]["available_seats"], 1);
}

#[tokio::test]
async fn login_failures_share_one_generic_message() {
    let app = build_app().await;
    signup(&app.router, "alice", "pw1").await;

    let (wrong_status, wrong_body) = send(
        &app.router,
        json_request("/login", None, &json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app.router,
        json_request("/login", None, &json!({ "username": "bob", "password": "pw1" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], "Invalid username or password");
    assert_eq!(wrong_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = build_app().await;

    let (status, _) = signup(&app.router, "alice", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = signup(&app.router, "alice", "pw2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username is already taken");

    // First credentials still work.
    login_token(&app.router, "alice", "pw1").await;
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = build_app().await;

    let (status, _) = send(&app.router, get_request("/my_bookings", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, get_request("/my_bookings", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_dashboard_gates_on_the_admin_flag() {
    let app = build_app().await;
    signup(&app.router, "alice", "pw1").await;
    signup(&app.router, "root", "pw2").await;
    app.store.promote_to_admin("root").await.unwrap();

    let token = login_token(&app.router, "alice", "pw1").await;
    let (status, body) = send(&app.router, get_request("/admin_dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let token = login_token(&app.router, "root", "pw2").await;
    let (status, body) = send(&app.router, get_request("/admin_dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 2);
    assert_eq!(body["bookings"], 0);
}

#[tokio::test]
async fn booking_a_missing_flight_is_distinct_from_sold_out() {
    let app = build_app().await;
    let flight_id = seed_flight(&app.store, "SK102", departure(9, 0), 1).await;

    signup(&app.router, "alice", "pw1").await;
    signup(&app.router, "bob", "pw2").await;
    let alice = login_token(&app.router, "alice", "pw1").await;
    let bob = login_token(&app.router, "bob", "pw2").await;

    let (status, body) = send(
        &app.router,
        form_request(
            "/book_flight",
            Some(&alice),
            format!("flight_id={}", Uuid::new_v4()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Flight not found");

    let (status, _) = send(
        &app.router,
        form_request("/book_flight", Some(&alice), format!("flight_id={flight_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        form_request("/book_flight", Some(&bob), format!("flight_id={flight_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "No available seats for this flight");
}

#[tokio::test]
async fn exact_search_excludes_near_misses() {
    let app = build_app().await;
    seed_flight(&app.store, "SK110", departure(10, 0), 60).await;
    seed_flight(&app.store, "SK111", departure(10, 30), 60).await;

    signup(&app.router, "alice", "pw1").await;
    let token = login_token(&app.router, "alice", "pw1").await;

    let (status, body) = send(
        &app.router,
        get_request("/search_flights?departure_time=2024-06-01T10:00", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let flights = body["flights"].as_array().unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["flight_number"], "SK110");

    // The day-bucket form catches both.
    let (status, body) = send(
        &app.router,
        json_request("/search_flights", Some(&token), &json!({ "date": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flights"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_without_criteria_is_a_validation_error() {
    let app = build_app().await;
    signup(&app.router, "alice", "pw1").await;
    let token = login_token(&app.router, "alice", "pw1").await;

    let (status, _) = send(&app.router, get_request("/search_flights", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        get_request("/search_flights?departure_time=garbage", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
