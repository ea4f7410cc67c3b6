use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,                    // assigned by the store
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub address: String,
    pub mobile: String,             // unique
    pub email: String,              // unique, login identifier
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Everything needed to persist a new account. `password_hash` must already be
/// an Argon2 hash.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub address: String,
    pub mobile: String,
    pub email: String,
}

/// Mutable profile fields; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Timestamps {
    /// Stamps for a freshly created record.
    pub fn on_create(now: OffsetDateTime) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub fn on_update(self, now: OffsetDateTime) -> Self {
        Self {
            created_at: self.created_at,
            updated_at: now.max(self.updated_at),
        }
    }
}

impl User {
    pub fn timestamps(&self) -> Timestamps {
        Timestamps {
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub(crate) fn apply(&mut self, changes: &ProfileChanges, now: OffsetDateTime) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(address) = &changes.address {
            self.address = address.clone();
        }
        let stamps = self.timestamps().on_update(now);
        self.updated_at = stamps.updated_at;
    }
}
