use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub type UserId = Uuid;

/// A registered account holder.
///
/// The password is an opaque credential handled by the authentication
/// boundary; the ledger never reads it. Serialized for display only, so
/// there is no way back from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration data for a user that has no identifier yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Materialize the user with a fresh id and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            password: self.password,
            created_at: now,
            updated_at: now,
        }
    }
}
