//! Shared state handed to every handler through axum's `State` extractor.

use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::config::{Environment, Settings};
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;

/// Cloning is cheap: services hold `Arc`ed repositories and the pool is an `Arc` internally.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub tokens: TokenCodec,
    /// `None` when running on the in-memory backend
    pub db_pool: Option<AsyncDbPool>,
    pub settings: Arc<Settings>,
    pub environment: Environment,
}

impl AppState {
    /// Wires services to PostgreSQL when a pool is given, to the in-memory store otherwise.
    pub fn new(settings: Settings, environment: Environment, db_pool: Option<AsyncDbPool>) -> Self {
        let repos = match &db_pool {
            Some(pool) => Repositories::postgres(pool.clone()),
            None => Repositories::in_memory(),
        };
        let tokens = TokenCodec::new(&settings.jwt);
        Self {
            services: Services::new(repos, tokens.clone()),
            tokens,
            db_pool,
            settings: Arc::new(settings),
            environment,
        }
    }

    /// In-memory state with a usable signing secret.
    #[cfg(test)]
    pub fn in_memory_for_tests() -> Self {
        Self::with_settings_for_tests(Settings::default())
    }

    #[cfg(test)]
    pub fn with_settings_for_tests(mut settings: Settings) -> Self {
        settings.jwt.secret = "test_secret_key_at_least_32_characters_long".to_string();
        Self::new(settings, Environment::Test, None)
    }
}
