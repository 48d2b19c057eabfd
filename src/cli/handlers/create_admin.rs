//! Create-admin command handler

use crate::auth::TokenCodec;
use crate::config::{DatabaseBackend, Settings};
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::repositories::Repositories;
use crate::services::{Registration, UserService};

pub struct CreateAdminCommandHandler {
    config: Settings,
}

impl CreateAdminCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Inserts an active Admin account into the configured PostgreSQL database.
    ///
    /// # Errors
    /// - The in-memory backend would discard the account on exit
    /// - Invalid email or password, duplicate username or email
    pub async fn execute(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        if self.config.database.backend == DatabaseBackend::Memory {
            return Err(AppError::validation(
                "database.backend",
                "An admin created in the in-memory store would not outlive this command",
            ));
        }
        self.config.database.validate()?;

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let users = Repositories::postgres(pool).users;
        let service = UserService::new(users, TokenCodec::new(&self.config.jwt));

        let user = create_admin(&service, username, email, password).await?;
        println!("✓ Created admin '{}' (id {})", user.username, user.id);
        Ok(user)
    }
}

/// Applies the registration field rules, then creates the account with role Admin.
pub async fn create_admin(
    service: &UserService,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    if !email.contains('@') || email.len() > 100 {
        return Err(AppError::validation("email", "Invalid email format"));
    }
    if !(6..=100).contains(&password.chars().count()) {
        return Err(AppError::validation(
            "password",
            "Password must be between 6 and 100 characters",
        ));
    }

    service
        .create_admin(Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name: None,
            last_name: None,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repositories::memory::MemoryUserRepository;
    use std::sync::Arc;

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryUserRepository::default()),
            TokenCodec::new(&Default::default()),
        )
    }

    #[tokio::test]
    async fn test_creates_admin_and_rejects_duplicate() {
        let service = service();
        let user = create_admin(&service, "root", "root@example.com", "rootpass")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.is_active);

        let again = create_admin(&service, "root", "other@example.com", "rootpass").await;
        assert!(matches!(again, Err(AppError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_rejects_short_password() {
        match create_admin(&service(), "root", "root@example.com", "123").await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "password"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_backend_is_rejected() {
        let mut config = Settings::default();
        config.database.backend = DatabaseBackend::Memory;
        let result = CreateAdminCommandHandler::new(config)
            .execute("root", "root@example.com", "rootpass")
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
