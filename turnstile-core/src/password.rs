//! Password hashing
//!
//! The login path never compares passwords directly. It hands the submitted
//! password and a stored hash to a [`PasswordHasher`], which is expected to do
//! a comparison whose cost does not depend on the inputs.

use crate::crypto::generate_secure_token;

/// Hashes and verifies passwords.
///
/// Implementations must also supply a placeholder hash: a well-formed hash that
/// no password will ever match. The credential verifier compares against it
/// when the requested identity does not exist, so unknown and known identities
/// cost the same amount of work.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash a plaintext password for storage
    fn hash(&self, password: &str) -> String;

    /// Check `password` against `hash`. Malformed hashes verify as `false`.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// A hash with the same verification cost as a real one that never matches
    fn placeholder_hash(&self) -> &str;
}

/// Argon2id hashing via the `password-auth` crate.
pub struct Argon2PasswordHasher {
    placeholder: String,
}

impl Argon2PasswordHasher {
    /// Create a hasher.
    ///
    /// The placeholder is the hash of a random token that is dropped right
    /// away, so nothing can match it.
    pub fn new() -> Self {
        let placeholder = password_auth::generate_hash(generate_secure_token());
        Self { placeholder }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> String {
        password_auth::generate_hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        password_auth::verify_password(password, hash).is_ok()
    }

    fn placeholder_hash(&self) -> &str {
        &self.placeholder
    }
}
