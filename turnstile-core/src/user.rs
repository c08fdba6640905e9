//! Users as seen by the login path
//!
//! The user store is owned by the host application. This crate only reads the
//! subset of a user record it needs to verify a login:
//!
//! | Field           | Type             | Description                                  |
//! | --------------- | ---------------- | -------------------------------------------- |
//! | `id`            | `UserId`         | The unique identifier for the user.          |
//! | `email`         | `String`         | The login identity.                          |
//! | `name`          | `Option<String>` | Display name returned on a successful login. |
//! | `password_hash` | `String`         | PHC-formatted hash of the user's password.   |
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// A unique, stable identifier for a specific user
/// This value should be treated as opaque, and should not be used as a UUID even if it may look like one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stored credentials for a user, as returned by a [`CredentialRepository`].
///
/// [`CredentialRepository`]: crate::repositories::CredentialRepository
#[derive(Clone)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

// Keeps the hash out of logs and panic messages.
impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// The payload handed back to the caller after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

impl From<UserCredentials> for AuthenticatedUser {
    fn from(credentials: UserCredentials) -> Self {
        AuthenticatedUser {
            id: credentials.id,
            email: credentials.email,
            name: credentials.name,
        }
    }
}
