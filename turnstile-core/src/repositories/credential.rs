use crate::{Error, UserCredentials};
use async_trait::async_trait;

/// Read access to stored user credentials
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Find the credentials for the user with the given email.
    ///
    /// Returns `Ok(None)` when no such user exists. Store failures must be
    /// reported as `Err` so they are never mistaken for a wrong password.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, Error>;
}
