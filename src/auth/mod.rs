use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod gateway;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::{PublicUser, UpdateProfileRequest};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
