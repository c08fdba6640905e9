//! # Turnstile
//!
//! Turnstile guards password logins. It verifies submitted credentials against
//! your user store, takes the same time whether or not the account exists, and
//! blocks an account after repeated failures until a cooldown passes.
//!
//! Turnstile does not own your users. You give it read access to credentials
//! through a [`CredentialRepository`], and it keeps only the failure counters
//! it needs in memory.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turnstile::{InMemoryCredentialRepository, TurnstileBuilder, TurnstileError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Arc::new(InMemoryCredentialRepository::new());
//!     let turnstile = TurnstileBuilder::new()
//!         .with_repository(users.clone())
//!         .build()
//!         .await?;
//!
//!     users.register("user@example.com", None, turnstile.hash_password("hunter22"))?;
//!
//!     match turnstile.login("user@example.com", "hunter22").await {
//!         Ok(user) => println!("Welcome back {}", user.email),
//!         Err(TurnstileError::TooManyAttempts { retry_after_seconds }) => {
//!             println!("Locked out, retry in {retry_after_seconds:?}s")
//!         }
//!         Err(e) => println!("Login failed: {e}"),
//!     }
//!
//!     turnstile.shutdown().await;
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use tokio::sync::Mutex;
use turnstile_core::{
    error::AuthError,
    services::{AttemptTracker, LoginService, SweepHandle},
};

mod builder;

pub use builder::{NoRepository, TurnstileBuilder, TurnstileBuilderError, WithRepository};

/// Re-export core types from turnstile_core
///
/// These types are commonly used when working with the Turnstile API.
pub use turnstile_core::{
    Argon2PasswordHasher, AuthenticatedUser, Clock, LockoutStatus, ManualClock, PasswordHasher,
    SystemClock, ThrottleConfig, UserCredentials, UserId,
    repositories::{CredentialRepository, InMemoryCredentialRepository},
    services::LoginOutcome,
};

/// Errors that can occur when using Turnstile.
#[derive(Debug, thiserror::Error)]
pub enum TurnstileError {
    /// Wrong password or unknown account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account is locked out after repeated failures
    #[error("Too many failed login attempts. Please try again later.")]
    TooManyAttempts { retry_after_seconds: Option<i64> },

    /// The user store could not be reached. Not counted as a failed attempt.
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] turnstile_core::Error),
}

impl From<AuthError> for TurnstileError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => TurnstileError::InvalidCredentials,
            AuthError::TooManyAttempts {
                retry_after_seconds,
            } => TurnstileError::TooManyAttempts {
                retry_after_seconds,
            },
        }
    }
}

/// The login coordinator.
///
/// `Turnstile` owns the attempt tracker for its lifetime: the background sweep
/// is started by [`TurnstileBuilder::build`] and stopped by
/// [`Turnstile::shutdown`] (or when the `Turnstile` is dropped).
pub struct Turnstile<R: CredentialRepository, H: PasswordHasher = Argon2PasswordHasher> {
    login_service: LoginService<R, H>,
    tracker: Arc<AttemptTracker>,
    hasher: Arc<H>,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl<R: CredentialRepository, H: PasswordHasher> Turnstile<R, H> {
    pub(crate) fn from_parts(
        login_service: LoginService<R, H>,
        hasher: Arc<H>,
        sweeper: Option<SweepHandle>,
    ) -> Self {
        let tracker = Arc::clone(login_service.tracker());
        Self {
            login_service,
            tracker,
            hasher,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Log a user in with their email and password
    ///
    /// # Arguments
    ///
    /// * `email`: The email of the user to log in
    /// * `password`: The submitted password
    ///
    /// # Returns
    ///
    /// The authenticated user on success. The attempt that reaches the failure
    /// threshold already returns [`TurnstileError::TooManyAttempts`].
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, TurnstileError> {
        let outcome = self.login_service.attempt_login(email, password).await?;
        Ok(outcome.into_result()?)
    }

    /// Run a login attempt and return the raw outcome, including the
    /// throttling status after the attempt.
    pub async fn attempt_login(&self, email: &str, password: &str) -> Result<LoginOutcome, TurnstileError> {
        Ok(self.login_service.attempt_login(email, password).await?)
    }

    /// Get the current lockout status for an email address
    pub fn lockout_status(&self, email: &str) -> LockoutStatus {
        self.tracker.lockout_status(email)
    }

    /// Unlock an account, e.g. after a password reset.
    ///
    /// Returns `true` if the account was locked.
    pub fn unlock(&self, email: &str) -> bool {
        self.tracker.unlock(email)
    }

    /// Hash a password with the configured hasher, for storing new credentials
    pub fn hash_password(&self, password: &str) -> String {
        self.hasher.hash(password)
    }

    pub fn tracker(&self) -> &AttemptTracker {
        &self.tracker
    }

    /// Stop the background sweep and wait for it to exit. Safe to call twice.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.shutdown().await;
        }
    }
}
