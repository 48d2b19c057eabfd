//! Caller identity: token issuance/verification and authorization decisions.

pub mod guard;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::models::Role;

pub use guard::{Decision, DenyReason, authorize};
pub use token::{AuthError, Claims, IssuedToken, TokenCodec};

/// The authenticated caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}
