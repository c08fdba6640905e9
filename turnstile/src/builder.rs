//! Builder pattern for constructing Turnstile instances
//!
//! This module provides a type-safe builder for creating [`Turnstile`] instances
//! with compile-time validation that a credential repository was supplied.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Duration;
//! use turnstile::{InMemoryCredentialRepository, ThrottleConfig, TurnstileBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let turnstile = TurnstileBuilder::new()
//!         .with_repository(Arc::new(InMemoryCredentialRepository::new()))
//!         .with_throttle_config(
//!             ThrottleConfig::default()
//!                 .max_failed_attempts(3)
//!                 .expiry_window(Duration::minutes(15)),
//!         )
//!         .build()
//!         .await?;
//!
//!     turnstile.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use turnstile_core::{
    Argon2PasswordHasher, Clock, PasswordHasher, SystemClock, ThrottleConfig,
    repositories::{CredentialRepository, InMemoryCredentialRepository},
    services::{AttemptTracker, CredentialVerifier, LoginService},
};

use crate::Turnstile;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Turnstile instance.
#[derive(Debug, thiserror::Error)]
pub enum TurnstileBuilderError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no repository has been configured yet.
///
/// This is the initial state of [`TurnstileBuilder`].
pub struct NoRepository;

/// Marker type indicating a repository has been configured.
///
/// Holds the credential repository and the password hasher Turnstile will use.
pub struct WithRepository<R: CredentialRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Turnstile`] instances.
///
/// # Type States
///
/// - [`NoRepository`]: Initial state, a repository must be configured
/// - [`WithRepository<R, H>`]: Repository configured, ready to build
pub struct TurnstileBuilder<Storage> {
    storage: Storage,
    throttle_config: ThrottleConfig,
    clock: Arc<dyn Clock>,
    start_sweep: bool,
}

impl Default for TurnstileBuilder<NoRepository> {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnstileBuilder<NoRepository> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Throttling: enabled (5 attempts, 30 min expiry, 1 s sweep)
    /// - Clock: system clock
    /// - Background sweep: started on build
    pub fn new() -> Self {
        Self {
            storage: NoRepository,
            throttle_config: ThrottleConfig::default(),
            clock: Arc::new(SystemClock),
            start_sweep: true,
        }
    }

    /// Use `repository` for credential lookups, hashing with Argon2.
    pub fn with_repository<R: CredentialRepository>(
        self,
        repository: Arc<R>,
    ) -> TurnstileBuilder<WithRepository<R, Argon2PasswordHasher>> {
        self.with_repository_and_hasher(repository, Arc::new(Argon2PasswordHasher::new()))
    }

    /// Use `repository` for credential lookups and `hasher` for password hashes.
    pub fn with_repository_and_hasher<R: CredentialRepository, H: PasswordHasher>(
        self,
        repository: Arc<R>,
        hasher: Arc<H>,
    ) -> TurnstileBuilder<WithRepository<R, H>> {
        TurnstileBuilder {
            storage: WithRepository { repository, hasher },
            throttle_config: self.throttle_config,
            clock: self.clock,
            start_sweep: self.start_sweep,
        }
    }

    /// Use a fresh in-memory repository.
    pub fn with_in_memory_repository(
        self,
    ) -> TurnstileBuilder<WithRepository<InMemoryCredentialRepository, Argon2PasswordHasher>> {
        self.with_repository(Arc::new(InMemoryCredentialRepository::new()))
    }
}

// ============================================================================
// Configuration Methods (available in any state)
// ============================================================================

impl<S> TurnstileBuilder<S> {
    /// Configure login throttling.
    ///
    /// Default: enabled, 5 failed attempts, 30 minute expiry window
    pub fn with_throttle_config(mut self, config: ThrottleConfig) -> Self {
        self.throttle_config = config;
        self
    }

    /// Configure login throttling from `TURNSTILE_*` environment variables.
    ///
    /// See [`ThrottleConfig::from_env`] for the variables read.
    pub fn with_throttle_config_from_env(mut self) -> Result<Self, TurnstileBuilderError> {
        self.throttle_config = ThrottleConfig::from_env()
            .map_err(|e| TurnstileBuilderError::InvalidConfiguration(e.to_string()))?;
        Ok(self)
    }

    /// Set the clock used to timestamp failed attempts.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set whether `build` starts the background sweep.
    ///
    /// Default: true. Without the sweep, expired records still stop blocking
    /// but are only reclaimed by calling [`AttemptTracker::sweep`].
    pub fn start_sweep(mut self, start: bool) -> Self {
        self.start_sweep = start;
        self
    }
}

impl<R: CredentialRepository, H: PasswordHasher> TurnstileBuilder<WithRepository<R, H>> {
    /// Replace the password hasher.
    pub fn with_password_hasher<H2: PasswordHasher>(
        self,
        hasher: Arc<H2>,
    ) -> TurnstileBuilder<WithRepository<R, H2>> {
        TurnstileBuilder {
            storage: WithRepository {
                repository: self.storage.repository,
                hasher,
            },
            throttle_config: self.throttle_config,
            clock: self.clock,
            start_sweep: self.start_sweep,
        }
    }

    /// Build the Turnstile instance.
    ///
    /// Validates the throttle configuration and, unless disabled, spawns the
    /// background sweep on the current tokio runtime.
    pub async fn build(self) -> Result<Turnstile<R, H>, TurnstileBuilderError> {
        self.throttle_config
            .validate()
            .map_err(|e| TurnstileBuilderError::InvalidConfiguration(e.to_string()))?;

        let run_sweep = self.start_sweep && self.throttle_config.enabled;
        let tracker = Arc::new(AttemptTracker::with_clock(self.throttle_config, self.clock));
        let sweeper = run_sweep.then(|| tracker.start_sweep_task());

        let WithRepository { repository, hasher } = self.storage;
        let verifier = CredentialVerifier::new(repository, Arc::clone(&hasher));
        let login_service = LoginService::new(tracker, verifier);

        tracing::debug!(sweep = run_sweep, "Turnstile initialized");
        Ok(Turnstile::from_parts(login_service, hasher, sweeper))
    }
}
