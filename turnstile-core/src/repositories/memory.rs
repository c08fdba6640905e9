use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    Error, UserCredentials, UserId,
    error::StorageError,
    repositories::CredentialRepository,
    validation::validate_email,
};

/// A [`CredentialRepository`] kept entirely in memory, keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryCredentialRepository {
    users: DashMap<String, UserCredentials>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store credentials for a new user.
    ///
    /// `password_hash` must already be hashed; see
    /// [`PasswordHasher::hash`](crate::PasswordHasher::hash).
    pub fn register(
        &self,
        email: &str,
        name: Option<String>,
        password_hash: String,
    ) -> Result<UserCredentials, Error> {
        validate_email(email)?;

        let credentials = UserCredentials {
            id: UserId::new_random(),
            email: email.to_string(),
            name,
            password_hash,
        };

        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => Err(Error::Storage(StorageError::Constraint(
                format!("email already registered: {email}"),
            ))),
            Entry::Vacant(slot) => {
                slot.insert(credentials.clone());
                Ok(credentials)
            }
        }
    }

    /// Remove a user, returning whether one was stored
    pub fn remove(&self, email: &str) -> bool {
        self.users.remove(email).is_some()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, Error> {
        Ok(self.users.get(email).map(|entry| entry.value().clone()))
    }
}
