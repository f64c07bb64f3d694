use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                           // unique user ID
    pub email: String,                      // lower-cased, unique
    #[serde(skip_serializing)]
    pub password_hash: String,              // Argon2 hash, not exposed in JSON
    pub first_name: String,
    pub last_name: String,
    pub name: Option<String>,               // display name
    pub created_at: OffsetDateTime,         // creation timestamp
    pub updated_at: Option<OffsetDateTime>, // last effective profile update
}

/// Fields needed to insert a user; id and timestamps come from storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub name: Option<String>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

/// Display name derived at registration.
pub fn display_name(first_name: &str, last_name: &str) -> Option<String> {
    let joined = format!("{} {}", first_name.trim(), last_name.trim());
    let joined = joined.trim();
    (!joined.is_empty()).then(|| joined.to_string())
}
