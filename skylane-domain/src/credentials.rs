use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::info;

use crate::error::DomainError;
use crate::repository::UserRepository;
use crate::user::User;

/// Registration and password verification over a [`UserRepository`].
///
/// Only argon2id hashes in PHC string format are ever stored; the plaintext
/// never leaves this module. Lookup failures and hash mismatches both come
/// back as `InvalidCredentials` so callers cannot enumerate usernames.
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    // Verified against when the username is unknown, so a miss costs the
    // same hash work as a mismatch.
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>) -> Result<Self, DomainError> {
        let dummy_hash = hash_password("skylane-dummy-credential")?;
        Ok(Self { users, dummy_hash })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("Username must not be empty"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("Password must not be empty"));
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(DomainError::DuplicateUsername);
        }

        let user = User::new(username.to_string(), hash_password(password)?);
        // The unique constraint still backstops a concurrent signup race.
        self.users.insert(&user).await?;

        info!(username = %user.username, "account created");
        Ok(user)
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<User, DomainError> {
        match self.users.find_by_username(username).await? {
            Some(user) => {
                if verify_password(password, &user.password_hash) {
                    Ok(user)
                } else {
                    Err(DomainError::InvalidCredentials)
                }
            }
            None => {
                let _ = verify_password(password, &self.dummy_hash);
                Err(DomainError::InvalidCredentials)
            }
        }
    }

    /// Replaces the stored hash; the previous password stops verifying.
    pub async fn set_password(&self, username: &str, password: &str) -> Result<(), DomainError> {
        if password.is_empty() {
            return Err(DomainError::validation("Password must not be empty"));
        }

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        self.users
            .update_password_hash(user.id, &hash_password(password)?)
            .await
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(DomainError::storage)
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
