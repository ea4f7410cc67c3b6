use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::auth::{
    jwt::TokenService,
    password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking},
    repo::{StoreError, UserStore},
    repo_types::NewUser,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    // Verified against when the email is unknown so both login failures cost one hash.
    static ref DUMMY_HASH: Option<String> = hash_password("tracker-auth-dummy-password").ok();
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account already exists")]
    DuplicateAccount,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("credential store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
    #[error("password hashing failed")]
    Hashing(#[source] anyhow::Error),
    #[error("token signing failed")]
    Signing(#[source] anyhow::Error),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => AccountError::DuplicateAccount,
            StoreError::Unavailable(e) => AccountError::StoreUnavailable(e),
        }
    }
}

#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub password: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("password", &"[redacted]")
            .field("email", &self.email)
            .field("mobile", &self.mobile)
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
}

/// Registration and login on top of the store, the hasher and the token service.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    /// Also builds the dummy hash, so the first unknown-email login does not pay for it.
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        if DUMMY_HASH.is_none() {
            error!("dummy hash unavailable, unknown-email logins skip the verify");
        }
        Self { store, tokens }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> Result<RegisterOutcome, AccountError> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            warn!("email already registered");
            return Err(AccountError::DuplicateAccount);
        }

        let password_hash = hash_password_blocking(input.password)
            .await
            .map_err(AccountError::Hashing)?;

        let user = self
            .store
            .create(NewUser {
                name: input.name,
                password_hash,
                address: input.address,
                mobile: input.mobile,
                email: input.email,
            })
            .await
            .map_err(|e| {
                match &e {
                    StoreError::Duplicate(field) => warn!(field, "uniqueness violated on insert"),
                    StoreError::Unavailable(source) => error!(error = %source, "create user failed"),
                }
                AccountError::from(e)
            })?;

        info!(user_id = user.id, "user registered");
        Ok(RegisterOutcome::Registered)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let user = self.store.find_by_email(email).await?;

        let Some(user) = user else {
            let password = password.to_owned();
            let dummy = tokio::task::spawn_blocking(move || {
                DUMMY_HASH
                    .as_deref()
                    .map(|dummy| verify_password(&password, dummy))
            })
            .await;
            if let Err(e) = dummy {
                error!(error = %e, "dummy verify task failed");
            }
            warn!("login unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        let ok = verify_password_blocking(password.to_owned(), user.password_hash.clone())
            .await
            .map_err(|e| {
                error!(error = %e, user_id = user.id, "stored hash unreadable");
                AccountError::Hashing(e)
            })?;
        if !ok {
            warn!(user_id = user.id, "login invalid password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.email).map_err(AccountError::Signing)?;
        info!(user_id = user.id, "user logged in");
        Ok(token)
    }
}
