//! Board password hashing.
//!
//! Boards store the hex digest of `password + salt`, never the plain text.
//! An empty password means "unprotected" and stays empty after hashing so
//! that `board.password.is_empty()` keeps working as the protection check.

use sha2::{Digest, Sha256};

/// Fixed salt appended to every board password before hashing.
const PASSWORD_SALT: &str = "hy^*%#*9";

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hash a board password for storage and comparison.
pub fn hash_password(plain: &str) -> String {
    if plain.is_empty() {
        return String::new();
    }
    sha256_hex(format!("{plain}{PASSWORD_SALT}").as_bytes())
}
