use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::auth::repo_types::{NewUser, ProfileChanges, Timestamps, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a user with this {0} already exists")]
    Duplicate(&'static str),
    #[error("credential store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Persistence for user records. Implementations own the uniqueness of
/// `email` and `mobile`; callers may pre-check but must not rely on it.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_profile(
        &self,
        email: &str,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

const USER_COLUMNS: &str =
    "id, name, password_hash, address, mobile, email, created_at, updated_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("mobile") => "mobile",
                _ => "email",
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Unavailable(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let stamps = Timestamps::on_create(OffsetDateTime::now_utc());
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, password_hash, address, mobile, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.address)
        .bind(&user.mobile)
        .bind(&user.email)
        .bind(stamps.created_at)
        .bind(stamps.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    async fn update_profile(
        &self,
        email: &str,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.db.begin().await?;
        let current = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 FOR UPDATE"
        ))
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut user) = current else {
            return Ok(None);
        };
        user.apply(&changes, OffsetDateTime::now_utc());

        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET name = $1, address = $2, updated_at = $3
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.address)
        .bind(user.updated_at)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryTables {
    next_id: i64,
    users: Vec<User>,
}

/// In-process store. The uniqueness check and the insert happen under one lock.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<MemoryTables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tables().users.len()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, MemoryTables> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if tables.users.iter().any(|u| u.mobile == user.mobile) {
            return Err(StoreError::Duplicate("mobile"));
        }

        tables.next_id += 1;
        let stamps = Timestamps::on_create(OffsetDateTime::now_utc());
        let created = User {
            id: tables.next_id,
            name: user.name,
            password_hash: user.password_hash,
            address: user.address,
            mobile: user.mobile,
            email: user.email,
            created_at: stamps.created_at,
            updated_at: stamps.updated_at,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        email: &str,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables();
        let Some(user) = tables.users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };
        user.apply(&changes, OffsetDateTime::now_utc());
        Ok(Some(user.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
