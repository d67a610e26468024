pub mod booking;
pub mod credentials;
pub mod error;
pub mod flight;
pub mod repository;
pub mod user;

pub use booking::Booking;
pub use credentials::CredentialService;
pub use error::DomainError;
pub use flight::Flight;
pub use user::{SessionPrincipal, User};
