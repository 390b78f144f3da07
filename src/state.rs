use crate::auth::{memory::InMemoryUserStore, repo::PgUserStore, repo::UserStore, services::AuthService};
use crate::config::AppConfig;
use crate::projects::{
    memory::InMemoryProjectStore, repo::PgProjectStore, repo::ProjectStore, services::ProjectService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub projects: ProjectService,
}

impl AppState {
    /// Both stores share the one pool opened at startup.
    pub fn postgres(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgProjectStore::new(db)),
        )
    }

    pub fn in_memory(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        Self::from_parts(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryProjectStore::new()),
        )
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthService::new(users, &config)?,
            projects: ProjectService::new(projects),
            config,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(Arc::new(test_config())).expect("in-memory state")
    }
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        max_connections: 1,
        jwt: crate::config::JwtConfig {
            secret: "test".into(),
            algorithm: jsonwebtoken::Algorithm::HS256,
            ttl: std::time::Duration::from_secs(300),
        },
        allowed_origins: vec![crate::config::DEFAULT_ALLOWED_ORIGIN.into()],
        // Lowest Argon2 time cost keeps the suite fast.
        password_cost: 1,
    }
}
