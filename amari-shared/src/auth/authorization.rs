/// Authorization helpers and permission checks
///
/// # Permission Model
///
/// 1. **Role**: `admin` may do everything; `vendor` and `couple` act on their
///    own records.
/// 2. **Ownership**: owner-scoped resources (budget items, guests, posts,
///    vendor listings) are writable by their owner, and by admins where the
///    endpoint allows it.
///
/// # Example
///
/// ```no_run
/// use amari_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use amari_shared::auth::session::AuthContext;
/// use uuid::Uuid;
///
/// fn can_delete_post(auth: &AuthContext, author_id: Option<Uuid>) -> bool {
///     require_owner_or_admin(auth, author_id).is_ok()
/// }
///
/// fn can_review(auth: &AuthContext) -> bool {
///     require_admin(auth).is_ok()
/// }
/// ```

use uuid::Uuid;

use super::session::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User doesn't have required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Checks that the caller has exactly `required` or is an admin
///
/// # Errors
///
/// Returns `AuthzError::InsufficientRole` otherwise
pub fn require_role(auth: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if auth.role == required || auth.role == UserRole::Admin {
        return Ok(());
    }

    Err(AuthzError::InsufficientRole {
        required,
        actual: auth.role,
    })
}

/// Checks that the caller is an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, UserRole::Admin)
}

/// Checks that the caller owns the resource
pub fn require_ownership(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}

/// Checks that the caller owns the resource or is an admin
///
/// Resources without an owner are only accessible to admins.
pub fn require_owner_or_admin(
    auth: &AuthContext,
    resource_owner_id: Option<Uuid>,
) -> Result<(), AuthzError> {
    if auth.is_admin() {
        return Ok(());
    }

    match resource_owner_id {
        Some(owner) => require_ownership(auth, owner),
        None => Err(AuthzError::NotAuthorized),
    }
}
