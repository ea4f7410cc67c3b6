use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        extractors::AuthUser, handlers::reject, repo_types::ProfileChanges, PublicUser,
        UpdateProfileRequest,
    },
    state::AppState,
};

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .store
        .find_by_email(&email)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| {
            error!(%email, "token subject has no account");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let changes = ProfileChanges {
        name: payload.name.map(|n| n.trim().to_owned()),
        address: payload.address.map(|a| a.trim().to_owned()),
    };
    if changes.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Nothing to update".into()));
    }
    if changes.name.as_deref() == Some("") || changes.address.as_deref() == Some("") {
        warn!("blank profile field");
        return Err((StatusCode::BAD_REQUEST, "Fields must not be blank".into()));
    }

    let user = state
        .store
        .update_profile(&email, changes)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn test_me_response_serialization() {
        let now = OffsetDateTime::now_utc();
        let response = PublicUser {
            id: 7,
            name: "Alice".into(),
            email: "test@example.com".to_string(),
            mobile: "555".into(),
            address: "1 Rd".into(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"id\":7"));
        assert!(!json.contains("password"));
    }
}
