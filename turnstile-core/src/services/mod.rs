//! Service layer for business logic
//!
//! - [`AttemptTracker`] counts failed logins per identity and decides who is blocked.
//! - [`CredentialVerifier`] checks a password against the stored hash.
//! - [`LoginService`] runs a login attempt through both.

pub mod attempt_tracker;
pub mod credential_verifier;
pub mod login;

pub use attempt_tracker::{AttemptRecord, AttemptTracker, SweepHandle};
pub use credential_verifier::{CredentialVerifier, Verification};
pub use login::{LoginOutcome, LoginService};
