use std::sync::Arc;

use tracing::{debug, info, warn};

use super::jwt::JwtKeys;
use super::password::{verify_password, PasswordHasher};
use super::repo::UserStore;
use super::repo_types::NewUser;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Registration and login over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            users,
            hasher: PasswordHasher::new(config.password_cost)?,
            keys: JwtKeys::new(&config.jwt),
        })
    }

    #[cfg(test)]
    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Creates a user with a hashed password. The store's uniqueness check is
    /// authoritative; the lookup beforehand only saves hashing for known emails.
    pub async fn register(&self, name: String, email: String, password: String) -> AppResult<()> {
        if self.users.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::DuplicateIdentity);
        }

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(anyhow::Error::from)??;

        let user = self
            .users
            .insert(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .inspect_err(|e| debug!(error = %e, "insert user failed"))?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(())
    }

    /// Verifies credentials and returns a signed token.
    pub async fn login(&self, email: String, password: String) -> AppResult<String> {
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(%email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(anyhow::Error::from)??;
        if !ok {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.keys.sign(&user.email)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(token)
    }
}
