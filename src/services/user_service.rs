//! Accounts: registration, login, profile and admin management.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{AuthUser, IssuedToken, TokenCodec};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, UpdateUser, User};
use crate::repositories::UserRepository;
use crate::utils::password::{hash_password, verify_password};

/// Fields needed to open an account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A signed-in user and their fresh token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, tokens: TokenCodec) -> Self {
        Self { repo, tokens }
    }

    /// Creates a `User` account and signs it in.
    pub async fn register(&self, registration: Registration) -> AppResult<Session> {
        self.tokens.ensure_signing()?;
        let user = self.create_account(registration, Role::User).await?;
        let token = self.tokens.issue(&AuthUser::from(&user))?;
        Ok(Session { user, token })
    }

    /// Bootstraps an administrator; registration can only produce `User` accounts.
    pub async fn create_admin(&self, registration: Registration) -> AppResult<User> {
        self.create_account(registration, Role::Admin).await
    }

    async fn create_account(&self, registration: Registration, role: Role) -> AppResult<User> {
        if self.repo.find_by_username(&registration.username).await?.is_some() {
            return Err(AppError::duplicate("users", "username", &registration.username));
        }
        if self.repo.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::duplicate("users", "email", &registration.email));
        }

        let user = self
            .repo
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash: hash_password(&registration.password)?,
                role,
                first_name: registration.first_name,
                last_name: registration.last_name,
                is_active: true,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, %role, "Account created");
        Ok(user)
    }

    /// Unknown users, inactive users and wrong passwords all get the same 401.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let invalid = || AppError::Unauthorized {
            message: "Invalid username or password".to_string(),
        };

        let user = self.repo.find_by_username(username).await?.ok_or_else(invalid)?;
        if !user.is_active || !verify_password(password, &user.password_hash)? {
            tracing::warn!(%username, "Failed login attempt");
            return Err(invalid());
        }

        let now = Utc::now();
        let user = self
            .repo
            .update(
                user.id,
                UpdateUser {
                    last_login_at: Some(now),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", user.id))?;

        let token = self.tokens.issue(&AuthUser::from(&user))?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(Session { user, token })
    }

    /// Active user by id.
    pub async fn get(&self, user_id: i32) -> AppResult<User> {
        self.repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))
    }

    pub async fn list_active(&self) -> AppResult<Vec<User>> {
        self.repo.list_active().await
    }

    pub async fn update_profile(&self, user_id: i32, changes: ProfileChanges) -> AppResult<User> {
        self.get(user_id).await?;

        if let Some(email) = changes.email.as_deref() {
            let taken = self
                .repo
                .find_by_email(email)
                .await?
                .is_some_and(|other| other.id != user_id);
            if taken {
                return Err(AppError::duplicate("users", "email", email));
            }
        }

        self.repo
            .update(
                user_id,
                UpdateUser {
                    email: changes.email,
                    first_name: changes.first_name,
                    last_name: changes.last_name,
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", user_id))
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get(user_id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(AppError::validation(
                "current_password",
                "Current password is incorrect",
            ));
        }

        self.repo
            .update(
                user_id,
                UpdateUser {
                    password_hash: Some(hash_password(new_password)?),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Soft delete. A user already deactivated is `NotFound`.
    pub async fn deactivate(&self, user_id: i32) -> AppResult<()> {
        self.get(user_id).await?;
        self.repo
            .update(
                user_id,
                UpdateUser {
                    is_active: Some(false),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id, "User deactivated");
        Ok(())
    }
}
