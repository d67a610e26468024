use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username is already taken")]
    DuplicateUsername,

    #[error("Flight not found")]
    FlightNotFound,

    #[error("No available seats for this flight")]
    NoSeatsAvailable,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("storage unavailable")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DomainError {
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
