use axum::{
    extract::State,
    http::Method,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod search;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let session = Router::new()
        .route("/logout", get(auth::logout))
        .route(
            "/search_flights",
            get(search::search_flights_get).post(search::search_flights_post),
        )
        .route("/book_flight", post(bookings::book_flight))
        .route("/my_bookings", get(bookings::my_bookings))
        .route("/admin_dashboard", get(admin::admin_dashboard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ));

    Router::new()
        .route("/", get(index))
        .merge(auth::routes())
        .merge(session)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "skylane",
        "message": "Flight booking service. Sign up, search flights, book a seat.",
    }))
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let ip = addr.ip().to_string();
    let key = format!("ratelimit:{}", ip);

    match state
        .redis
        .check_rate_limit(&key, state.rate_limit.requests, state.rate_limit.window_seconds)
        .await
    {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
