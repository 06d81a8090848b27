/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`token`]: opaque session and reset tokens, stored as SHA-256 digests
/// - [`session`]: session token validation and the request [`session::AuthContext`]
/// - [`authorization`]: role and ownership checks
///
/// # Example
///
/// ```no_run
/// use amari_shared::auth::password::{hash_password, verify_password};
/// use amari_shared::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let session_token = generate_token();
/// assert_eq!(session_token.plaintext.len(), 64);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod password;
pub mod session;
pub mod token;
