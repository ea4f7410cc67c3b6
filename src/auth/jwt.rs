use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and parses the HS256 bearer tokens. Built once at startup from the
/// signing secret and shared read-only afterwards.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenService {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str) -> anyhow::Result<String> {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    pub fn parse(&self, token: &str) -> Result<String, TokenError> {
        self.parse_at(token, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, subject: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).context("token lifetime too large")?;
        let exp = now
            .checked_add(TimeDuration::seconds(ttl_secs))
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: subject.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(subject = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Verifies the signature first, then checks expiry against `now` with no leeway.
    pub(crate) fn parse_at(&self, token: &str, now: OffsetDateTime) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if now.unix_timestamp() >= data.claims.exp as i64 {
            return Err(TokenError::Expired);
        }
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}
