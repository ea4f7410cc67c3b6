use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;

/// Request body for user registration. Every field is required.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("password", &"[redacted]")
            .field("email", &self.email)
            .field("mobile", &self.mobile)
            .field("address", &self.address)
            .finish()
    }
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Request body for `PATCH /me`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            mobile: u.mobile,
            address: u.address,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_debug_hides_password() {
        let register: RegisterRequest = serde_json::from_str(
            r#"{"name":"Alice","password":"hunter22","email":"a@x.com","mobile":"555","address":"1 Rd"}"#,
        )
        .unwrap();
        let printed = format!("{register:?}");
        assert!(!printed.contains("hunter22"));
        assert!(printed.contains("a@x.com"));

        let login: LoginRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"hunter22"}"#).unwrap();
        let printed = format!("{login:?}");
        assert!(!printed.contains("hunter22"));
        assert!(printed.contains("[redacted]"));
    }
}
