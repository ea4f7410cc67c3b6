use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use super::gateway::Identity;

/// Subject the gateway attached to this request, or 401 when there is none.
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .map(|identity| AuthUser(identity.subject.clone()))
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".into()))
    }
}
