use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skylane_domain::DomainError;

#[derive(Debug)]
pub enum ApiError {
    AuthenticationError(String),
    Domain(DomainError),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Domain(err) => match err {
                DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                DomainError::DuplicateUsername => (StatusCode::CONFLICT, err.to_string()),
                DomainError::FlightNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                DomainError::NoSeatsAvailable => (StatusCode::CONFLICT, err.to_string()),
                DomainError::Unauthorized => (StatusCode::FORBIDDEN, err.to_string()),
                DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                DomainError::Storage(source) => {
                    tracing::error!("Storage error: {}", source);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
            },
            ApiError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
