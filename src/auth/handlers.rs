use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        services::{is_valid_email, AccountError, Registration},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/user/register", post(register))
        .route("/auth/user/login", post(login))
        .route("/auth/user/home", get(home))
        .route("/auth/user/db-test", get(db_test))
}

type Rejection = (StatusCode, String);

/// Maps service failures to the plain-text bodies clients see.
pub(crate) fn reject(e: AccountError) -> Rejection {
    match e {
        AccountError::DuplicateAccount => (StatusCode::CONFLICT, "Account already exists".into()),
        AccountError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid email or password".into())
        }
        AccountError::StoreUnavailable(source) => {
            error!(error = %source, "credential store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".into(),
            )
        }
        AccountError::Hashing(source) | AccountError::Signing(source) => {
            error!(error = %source, "account operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
        }
    }
}

fn bad_request(msg: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, msg.to_owned())
}

fn require(field: &str, value: &str) -> Result<(), Rejection> {
    if value.trim().is_empty() {
        warn!(field, "missing field");
        return Err(bad_request(&format!("{field} is required")));
    }
    Ok(())
}

fn normalize_email(raw: &str) -> Result<String, Rejection> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(bad_request("Invalid email"));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, String), Rejection> {
    require("name", &payload.name)?;
    require("password", &payload.password)?;
    require("email", &payload.email)?;
    require("mobile", &payload.mobile)?;
    require("address", &payload.address)?;
    let email = normalize_email(&payload.email)?;

    state
        .accounts
        .register(Registration {
            name: payload.name.trim().to_owned(),
            password: payload.password,
            email,
            mobile: payload.mobile.trim().to_owned(),
            address: payload.address.trim().to_owned(),
        })
        .await
        .map_err(reject)?;

    Ok((StatusCode::CREATED, "Registration successful".into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<String, Rejection> {
    let email = normalize_email(&payload.email)?;
    require("password", &payload.password)?;

    state
        .accounts
        .login(&email, &payload.password)
        .await
        .map_err(reject)
}

pub async fn home() -> &'static str {
    "Welcome home"
}

#[instrument(skip(state))]
pub async fn db_test(State(state): State<AppState>) -> Result<&'static str, Rejection> {
    match state.store.ping().await {
        Ok(()) => {
            info!("database ping ok");
            Ok("Database connection successful")
        }
        Err(e) => {
            error!(error = %e, "database ping failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".into(),
            ))
        }
    }
}
