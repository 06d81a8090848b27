/// Session authentication
///
/// Resolves a presented session token into an [`AuthContext`]. The token can
/// arrive as `Authorization: Bearer <token>` or in the [`SESSION_COOKIE`]
/// cookie; extracting it is the caller's concern, this module only validates
/// it.
///
/// # Example
///
/// ```no_run
/// use amari_shared::auth::session::authenticate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = authenticate(&pool, token).await?;
/// println!("signed in as {} ({:?})", auth.email, auth.role);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::token::is_well_formed;
use crate::models::session::Session;
use crate::models::user::UserRole;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "amari_session";

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email of the user at authentication time
    pub email: String,

    /// Role of the user at authentication time
    pub role: UserRole,

    /// Session the request was authenticated with
    pub session_id: Uuid,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for session token validation
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No token was presented
    #[error("Authentication required")]
    Missing,

    /// Token does not have the shape of an issued token
    #[error("Malformed session token")]
    Malformed,

    /// Token is unknown, expired, or its user is inactive
    #[error("Invalid or expired session")]
    Invalid,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Extracts a bearer token from the `Authorization` header
///
/// Returns `None` when the header is absent or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validates a session token
///
/// # Errors
///
/// - `TokenError::Malformed` if the token is not 64 hex characters
/// - `TokenError::Invalid` if no live session matches
/// - `TokenError::DatabaseError` on lookup failure
pub async fn authenticate(pool: &PgPool, token: &str) -> Result<AuthContext, TokenError> {
    if !is_well_formed(token) {
        return Err(TokenError::Malformed);
    }

    let identity = Session::find_valid(pool, token)
        .await?
        .ok_or(TokenError::Invalid)?;

    Ok(AuthContext {
        user_id: identity.user_id,
        email: identity.email,
        role: UserRole::from_str(&identity.user_type).unwrap_or(UserRole::Couple),
        session_id: identity.session_id,
    })
}
