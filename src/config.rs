use anyhow::{bail, Context};

pub const MEMORY_STORE: &str = "memory";

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub public_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw}"))?,
            None => 60,
        };
        if ttl_minutes < 0 {
            bail!("JWT_TTL_MINUTES must not be negative");
        }
        if ttl_minutes > MAX_TTL_MINUTES {
            bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}");
        }

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "tracker-auth".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "tracker-users".into()),
            ttl_minutes,
        };
        let public_prefix = lookup("PUBLIC_PREFIX").unwrap_or_else(|| "/auth".into());

        Ok(Self {
            database_url,
            jwt,
            public_prefix,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/tracker"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.jwt.issuer, "tracker-auth");
        assert_eq!(cfg.jwt.audience, "tracker-users");
        assert_eq!(cfg.public_prefix, "/auth");
        assert!(!cfg.uses_memory_store());
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "15"),
            ("PUBLIC_PREFIX", "/open"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.ttl_minutes, 15);
        assert_eq!(cfg.public_prefix, "/open");
        assert!(cfg.uses_memory_store());
    }

    #[test]
    fn rejects_missing_or_blank_secret() {
        let missing = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "memory")]));
        assert!(missing.is_err());

        let blank = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "memory"),
            ("JWT_SECRET", "   "),
        ]));
        assert!(blank.unwrap_err().to_string().contains("must not be empty"));
    }

    #[test]
    fn rejects_bad_lifetime() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));
    }

    #[test]
    fn rejects_oversized_lifetime() {
        let lookup = |ttl: &'static str| {
            lookup_from(&[
                ("DATABASE_URL", "memory"),
                ("JWT_SECRET", "s3cret"),
                ("JWT_TTL_MINUTES", ttl),
            ])
        };

        let err = AppConfig::from_lookup(lookup("100000000000")).unwrap_err();
        assert!(err.to_string().contains("at most"));

        let year = AppConfig::from_lookup(lookup("525600")).expect("one year is allowed");
        assert_eq!(year.jwt.ttl_minutes, MAX_TTL_MINUTES);
        assert!(AppConfig::from_lookup(lookup("525601")).is_err());
    }
}
