//! Authentication-related Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;
use crate::services::{Registration, Session};

/// Register request payload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Username (unique)
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    #[schema(example = "john_doe", min_length = 3, max_length = 50)]
    pub username: String,
    /// Email address (unique)
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email cannot exceed 100 characters")
    )]
    #[schema(example = "user@example.com", format = "email", max_length = 100)]
    pub email: String,
    /// Plain text, hashed before storage
    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    #[schema(example = "password123", format = "password", min_length = 6, max_length = 100)]
    pub password: String,
    #[validate(length(max = 50, message = "First name cannot exceed 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "Last name cannot exceed 50 characters"))]
    pub last_name: Option<String>,
}

impl RegisterRequest {
    pub fn into_registration(self) -> Registration {
        Registration {
            username: self.username,
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

/// Login request payload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "john_doe")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123", format = "password")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    #[schema(format = "password")]
    pub current_password: String,
    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    #[schema(format = "password", min_length = 6, max_length = 100)]
    pub new_password: String,
}

/// Token plus the identity it was issued for.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub token: String,
    #[schema(example = 1)]
    pub user_id: i32,
    #[schema(example = "john_doe")]
    pub username: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token.token,
            user_id: session.user.id,
            username: session.user.username,
            email: session.user.email,
            role: session.user.role,
            expires_at: session.token.expires_at,
        }
    }
}
