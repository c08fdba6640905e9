//! Shared mocks for unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    Error, PasswordHasher, UserCredentials, crypto::constant_time_compare, error::StorageError,
    repositories::CredentialRepository,
};

/// Cheap reversible "hasher" that counts how often `verify` runs.
pub struct CountingHasher {
    placeholder: String,
    pub verify_calls: AtomicUsize,
    pub last_hash: Mutex<Option<String>>,
}

impl CountingHasher {
    pub const PLACEHOLDER_SECRET: &'static str = "placeholder-secret";

    fn encode(password: &str) -> String {
        format!("plain${password}")
    }
}

impl Default for CountingHasher {
    fn default() -> Self {
        Self {
            placeholder: Self::encode(Self::PLACEHOLDER_SECRET),
            verify_calls: AtomicUsize::new(0),
            last_hash: Mutex::new(None),
        }
    }
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, password: &str) -> String {
        Self::encode(password)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_hash.lock().unwrap() = Some(hash.to_string());
        constant_time_compare(Self::encode(password).as_bytes(), hash.as_bytes())
    }

    fn placeholder_hash(&self) -> &str {
        &self.placeholder
    }
}

/// A store that is always down.
pub struct FailingRepository;

#[async_trait]
impl CredentialRepository for FailingRepository {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserCredentials>, Error> {
        Err(Error::Storage(StorageError::Unavailable(
            "connection refused".to_string(),
        )))
    }
}
