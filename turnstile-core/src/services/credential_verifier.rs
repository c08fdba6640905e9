use std::sync::Arc;

use crate::{Error, PasswordHasher, UserCredentials, repositories::CredentialRepository};

/// Result of checking one set of submitted credentials.
#[derive(Debug)]
pub struct Verification {
    /// True only when a user was found and the password matched
    pub matched: bool,
    /// The user record, if one exists for the identity
    pub record: Option<UserCredentials>,
}

/// Checks submitted passwords against stored hashes.
///
/// Exactly one hash comparison runs per call, whether or not the identity
/// exists: unknown identities are compared against the hasher's placeholder
/// hash. This keeps "no such user" and "wrong password" indistinguishable by
/// response time.
pub struct CredentialVerifier<R: CredentialRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: CredentialRepository, H: PasswordHasher> CredentialVerifier<R, H> {
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Verify `password` for `email`.
    ///
    /// A failed store lookup is returned as an error and no comparison is
    /// made; it is not a verification failure.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Verification, Error> {
        let record = self
            .repository
            .find_by_email(email)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Credential lookup failed"))?;

        let hash = record
            .as_ref()
            .map_or(self.hasher.placeholder_hash(), |r| r.password_hash.as_str());
        let password_ok = self.hasher.verify(password, hash);

        Ok(Verification {
            matched: record.is_some() && password_ok,
            record,
        })
    }
}
