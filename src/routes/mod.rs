use axum::{routing::get, Router};

use crate::state::AppState;

pub mod home;
pub mod me;

/// Routes that only make sense for an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::get_me).patch(me::update_me))
        .route("/home/dashboard", get(home::dashboard))
}
