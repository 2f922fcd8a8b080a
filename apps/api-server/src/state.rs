//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::policy::VisibilityPolicy;
use blogicum_core::ports::{Clock, PasswordService, TokenService, UserRepository};
use blogicum_core::services::{BlogService, Repositories};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService, SystemClock};

#[cfg(feature = "postgres")]
use blogicum_infra::database::{connect, postgres_repo};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub login_url: String,
}

impl AppState {
    /// Build the application state, connecting to PostgreSQL when configured.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let state = Self::with_repositories(repos, Arc::new(SystemClock), config);

        tracing::info!("Application state initialized");
        state
    }

    /// Wire the services over already-built repositories.
    pub fn with_repositories(repos: Repositories, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let visibility = VisibilityPolicy::new(config.hide_uncategorized);

        Self {
            users: repos.users.clone(),
            blog: Arc::new(BlogService::new(repos, clock, visibility)),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            login_url: config.login_url.clone(),
        }
    }

    /// State over a fresh or shared in-memory store.
    pub fn in_memory(store: &InMemoryStore, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self::with_repositories(store.repositories(), clock, config)
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return InMemoryStore::new().repositories();
        };

        match connect(db_config).await {
            Ok(db) => postgres_repo::repositories(db),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                InMemoryStore::new().repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory repository");
        InMemoryStore::new().repositories()
    }
}
