//! Core functionality for turnstile
//!
//! This crate contains the login throttling and credential verification logic.
//!
//! It includes the [`AttemptTracker`](services::AttemptTracker), which blocks an
//! identity after repeated failures, the
//! [`CredentialVerifier`](services::CredentialVerifier), which checks passwords
//! without revealing whether an identity exists, and the
//! [`LoginService`](services::LoginService) that combines them.
//!
//! User storage and password hashing are supplied by the host application
//! through [`CredentialRepository`](repositories::CredentialRepository) and
//! [`PasswordHasher`].
pub mod clock;
pub mod crypto;
pub mod error;
pub mod id;
pub mod password;
pub mod repositories;
pub mod services;
pub mod throttle;
pub mod user;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use throttle::{LockoutStatus, ThrottleConfig};
pub use user::{AuthenticatedUser, UserCredentials, UserId};
