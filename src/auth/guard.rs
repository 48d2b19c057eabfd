//! Role and ownership decisions shared by every service.

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RoleMismatch,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Maps a denial to the generic 403 error. The reason only reaches the log.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::debug!(?reason, "Access denied");
                Err(AppError::access_denied())
            }
        }
    }
}

/// Decides whether `user` may act, given an optional role requirement and
/// the id of the user owning the resource.
pub fn authorize(
    user: &AuthUser,
    required_role: Option<Role>,
    resource_owner_id: Option<i32>,
) -> Decision {
    if let Some(required) = required_role {
        if !user.role.satisfies(required) {
            return Decision::Deny(DenyReason::RoleMismatch);
        }
    }

    if let Some(owner_id) = resource_owner_id {
        if user.role != Role::Admin && user.user_id != owner_id {
            return Decision::Deny(DenyReason::NotOwner);
        }
    }

    Decision::Allow
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        authorize(self, Some(Role::Admin), None).into_result()
    }

    pub fn require_owner(&self, owner_id: i32) -> AppResult<()> {
        authorize(self, None, Some(owner_id)).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(user_id: i32, role: Role) -> AuthUser {
        AuthUser {
            user_id,
            username: format!("user{}", user_id),
            email: format!("user{}@example.com", user_id),
            role,
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::User)]
    }

    proptest! {
        #[test]
        fn prop_admin_is_always_allowed(
            user_id in any::<i32>(),
            required in proptest::option::of(any_role()),
            owner in proptest::option::of(any::<i32>()),
        ) {
            let admin = user(user_id, Role::Admin);
            prop_assert_eq!(authorize(&admin, required, owner), Decision::Allow);
        }

        #[test]
        fn prop_user_is_denied_on_foreign_resources(
            user_id in any::<i32>(),
            owner in any::<i32>(),
        ) {
            prop_assume!(user_id != owner);
            let caller = user(user_id, Role::User);
            prop_assert_eq!(
                authorize(&caller, None, Some(owner)),
                Decision::Deny(DenyReason::NotOwner)
            );
            prop_assert_eq!(
                authorize(&caller, Some(Role::User), Some(owner)),
                Decision::Deny(DenyReason::NotOwner)
            );
        }
    }

    #[test]
    fn test_role_requirement() {
        let caller = user(1, Role::User);
        assert_eq!(
            authorize(&caller, Some(Role::Admin), None),
            Decision::Deny(DenyReason::RoleMismatch)
        );
        assert_eq!(authorize(&caller, Some(Role::User), None), Decision::Allow);
    }

    #[test]
    fn test_role_is_checked_before_ownership() {
        let caller = user(1, Role::User);
        assert_eq!(
            authorize(&caller, Some(Role::Admin), Some(1)),
            Decision::Deny(DenyReason::RoleMismatch)
        );
    }

    #[test]
    fn test_owner_is_allowed() {
        let caller = user(5, Role::User);
        assert_eq!(authorize(&caller, None, Some(5)), Decision::Allow);
        assert_eq!(authorize(&caller, None, None), Decision::Allow);
    }

    #[test]
    fn test_denial_maps_to_forbidden() {
        let caller = user(5, Role::User);
        assert!(matches!(caller.require_admin(), Err(AppError::Forbidden { .. })));
        assert!(matches!(caller.require_owner(6), Err(AppError::Forbidden { .. })));
        assert!(caller.require_owner(5).is_ok());
        assert!(user(9, Role::Admin).require_owner(5).is_ok());
    }
}
