#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use turnstile::{
    CredentialRepository, InMemoryCredentialRepository, ManualClock, PasswordHasher,
    ThrottleConfig, Turnstile, TurnstileBuilder, UserCredentials,
};
use turnstile_core::{Error, crypto::constant_time_compare, error::StorageError};

/// Hasher that skips the key stretching so tests stay fast, and counts
/// comparisons.
#[derive(Default)]
pub struct FastHasher {
    pub verify_calls: AtomicUsize,
}

impl FastHasher {
    pub fn calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl PasswordHasher for FastHasher {
    fn hash(&self, password: &str) -> String {
        format!("fast${password}")
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        constant_time_compare(self.hash(password).as_bytes(), hash.as_bytes())
    }

    fn placeholder_hash(&self) -> &str {
        "fast$\u{0}never"
    }
}

/// Store that fails every lookup.
pub struct DownRepository;

#[async_trait]
impl CredentialRepository for DownRepository {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserCredentials>, Error> {
        Err(Error::Storage(StorageError::Connection(
            "connection refused".to_string(),
        )))
    }
}

pub struct Fixture {
    pub turnstile: Turnstile<InMemoryCredentialRepository, FastHasher>,
    pub users: Arc<InMemoryCredentialRepository>,
    pub hasher: Arc<FastHasher>,
    pub clock: Arc<ManualClock>,
}

pub const PASSWORD: &str = "correct horse battery staple";

pub async fn fixture(config: ThrottleConfig) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let users = Arc::new(InMemoryCredentialRepository::new());
    let hasher = Arc::new(FastHasher::default());
    let clock = Arc::new(ManualClock::default());

    for (email, name) in [("a@x.com", "Alice"), ("b@x.com", "Bob")] {
        users
            .register(email, Some(name.to_string()), hasher.hash(PASSWORD))
            .unwrap();
    }

    let turnstile = TurnstileBuilder::new()
        .with_repository_and_hasher(users.clone(), hasher.clone())
        .with_throttle_config(config)
        .with_clock(clock.clone())
        .build()
        .await
        .unwrap();

    Fixture {
        turnstile,
        users,
        hasher,
        clock,
    }
}
