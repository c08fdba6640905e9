//! Throttled password login.
//!
//! [`LoginService`] ties the [`AttemptTracker`] and the [`CredentialVerifier`]
//! together. Each attempt goes through the same steps:
//!
//! 1. If the identity is blocked, stop. Nothing is verified or counted.
//! 2. Verify the credentials. A store failure is returned as an error and is
//!    not counted against the identity.
//! 3. On a match, clear the identity's failures and return the user.
//! 4. Otherwise count the failure and report the updated status.

use std::sync::Arc;

use crate::{
    AuthenticatedUser, Error, PasswordHasher,
    error::AuthError,
    repositories::CredentialRepository,
    services::{AttemptTracker, CredentialVerifier},
    throttle::LockoutStatus,
};

/// What happened to a login attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(AuthenticatedUser),
    /// Wrong password or unknown identity. The attempt was counted; `status`
    /// is the state after counting it and is locked if this attempt reached
    /// the threshold.
    InvalidCredentials { status: LockoutStatus },
    /// The identity was already blocked, so nothing was checked.
    TooManyAttempts { status: LockoutStatus },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success(_))
    }

    /// Collapse the outcome into what a caller should report.
    ///
    /// An invalid attempt that just reached the threshold is reported as
    /// [`AuthError::TooManyAttempts`] rather than waiting for the next request.
    pub fn into_result(self) -> Result<AuthenticatedUser, AuthError> {
        match self {
            LoginOutcome::Success(user) => Ok(user),
            LoginOutcome::InvalidCredentials { status } if !status.is_locked => {
                Err(AuthError::InvalidCredentials)
            }
            LoginOutcome::InvalidCredentials { status }
            | LoginOutcome::TooManyAttempts { status } => Err(AuthError::TooManyAttempts {
                retry_after_seconds: status.retry_after_seconds(),
            }),
        }
    }
}

/// Service for throttled password login
pub struct LoginService<R: CredentialRepository, H: PasswordHasher> {
    tracker: Arc<AttemptTracker>,
    verifier: CredentialVerifier<R, H>,
}

impl<R: CredentialRepository, H: PasswordHasher> LoginService<R, H> {
    pub fn new(tracker: Arc<AttemptTracker>, verifier: CredentialVerifier<R, H>) -> Self {
        Self { tracker, verifier }
    }

    pub fn tracker(&self) -> &Arc<AttemptTracker> {
        &self.tracker
    }

    /// Attempt a login for `email` with `password`.
    ///
    /// `Err` is reserved for infrastructure failures; every credential
    /// decision is an `Ok` [`LoginOutcome`].
    pub async fn attempt_login(&self, email: &str, password: &str) -> Result<LoginOutcome, Error> {
        let status = self.tracker.lockout_status(email);
        if status.is_locked {
            tracing::debug!("Rejected login attempt for throttled identity");
            return Ok(LoginOutcome::TooManyAttempts { status });
        }

        let verification = self.verifier.verify(email, password).await?;

        match verification.record {
            Some(record) if verification.matched => {
                self.tracker.record_success(email);
                Ok(LoginOutcome::Success(record.into()))
            }
            _ => {
                let status = self.tracker.record_failure(email);
                Ok(LoginOutcome::InvalidCredentials { status })
            }
        }
    }

    /// Attempt a login and collapse the outcome into a `Result`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser, Error> {
        Ok(self.attempt_login(email, password).await?.into_result()?)
    }
}
