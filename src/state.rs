use std::sync::Arc;

use crate::auth::{
    gateway::AuthGateway,
    jwt::TokenService,
    repo::{MemoryUserStore, PgUserStore, UserStore},
    services::AccountService,
};
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
    pub accounts: AccountService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = if config.uses_memory_store() {
            tracing::warn!("using in-memory credential store; accounts will not survive a restart");
            Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
        } else {
            let pool = db::connect(&config.database_url).await?;
            Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
        };

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.jwt));
        let accounts = AccountService::new(store.clone(), tokens.clone());
        Self {
            config,
            store,
            tokens,
            accounts,
        }
    }

    pub fn gateway(&self) -> AuthGateway {
        AuthGateway::new(self.tokens.clone(), self.config.public_prefix.clone())
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: crate::config::MEMORY_STORE.into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            public_prefix: "/auth".into(),
        });
        Self::from_parts(config, Arc::new(MemoryUserStore::new()))
    }
}
