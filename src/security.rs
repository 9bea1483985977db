use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with Argon2id and a fresh random salt
///
/// Returns the PHC string (`$argon2id$v=19$...`), which embeds the salt and
/// parameters so verification needs nothing else.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Access Tokens
// =============================================================================

/// Generate an opaque bearer token (64 hex characters, 244 random bits)
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Digest under which a token is stored
///
/// `digest = SHA256(token + pepper)`. The plaintext token is never stored.
pub fn token_digest(token: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
