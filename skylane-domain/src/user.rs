use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record as stored. Carries the password hash, so it is never
/// serialized into a response body directly -- see [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

/// User view safe for client responses (no password_hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Capability set an authenticated principal exposes to the session layer.
pub trait SessionPrincipal {
    fn is_authenticated(&self) -> bool;
    fn session_id(&self) -> String;
}

impl SessionPrincipal for User {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn session_id(&self) -> String {
        self.id.to_string()
    }
}
