/// Opaque session and password-reset tokens
///
/// Tokens are 32 random bytes rendered as 64 lowercase hex characters. The
/// plaintext is handed to the client once; the database only ever stores the
/// SHA-256 digest, so a leaked table cannot be replayed.
///
/// # Example
///
/// ```
/// use amari_shared::auth::token::{generate_token, hash_token, verify_token};
///
/// let token = generate_token();
/// assert_eq!(token.plaintext.len(), 64);
/// assert_eq!(token.hash, hash_token(&token.plaintext));
/// assert!(verify_token(&token.plaintext, &token.hash));
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a token
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Freshly generated token
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    /// Value returned to the client; never persisted
    pub plaintext: String,

    /// SHA-256 hex digest stored server-side
    pub hash: String,
}

/// Generates a new random token together with its storage hash
pub fn generate_token() -> GeneratedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let plaintext = hex::encode(bytes);
    let hash = hash_token(&plaintext);

    GeneratedToken { plaintext, hash }
}

/// SHA-256 hex digest of a token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks that a presented value looks like a token we issued
///
/// Rejects anything that is not exactly 64 hex characters before it reaches
/// the database.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compares a presented token with a stored hash in constant time
pub fn verify_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_token(token), stored_hash)
}

/// Constant-time string comparison
///
/// Length mismatch returns early; equal-length inputs are always compared in
/// full.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();

        assert_eq!(token.plaintext.len(), TOKEN_LENGTH);
        assert!(token
            .plaintext
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(token.hash.len(), 64);
        assert_ne!(token.plaintext, token.hash);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_token_known_value() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_token() {
        let token = generate_token();
        assert!(verify_token(&token.plaintext, &token.hash));
        assert!(!verify_token(&generate_token().plaintext, &token.hash));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&generate_token().plaintext));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"g".repeat(TOKEN_LENGTH)));
        assert!(!is_well_formed(&"a".repeat(TOKEN_LENGTH + 1)));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello!"));
        assert!(constant_time_compare("", ""));
    }
}
