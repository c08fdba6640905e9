//! Login throttling configuration and status types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest expiry window [`ThrottleConfig::validate`] accepts.
pub const MAX_EXPIRY_WINDOW: Duration = Duration::days(365 * 100);

/// Configuration for per-identity login throttling.
///
/// # Defaults
///
/// - Enabled
/// - 5 failed attempts before an identity is blocked
/// - A record expires 30 minutes after its most recent failure
/// - Expired records are swept once per second
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Whether throttling is enabled at all
    pub enabled: bool,
    /// Failures at which an identity becomes blocked
    pub max_failed_attempts: u32,
    /// How long after the most recent failure a record stays alive
    pub expiry_window: Duration,
    /// Cadence of the background sweep
    pub sweep_interval: std::time::Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 5,
            expiry_window: Duration::minutes(30),
            sweep_interval: std::time::Duration::from_secs(1),
        }
    }
}

impl ThrottleConfig {
    /// A configuration that never blocks and records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    pub fn expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    pub fn sweep_interval(mut self, interval: std::time::Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Read overrides from the environment, falling back to the defaults.
    ///
    /// # Returns
    ///
    /// The validated configuration, or [`ValidationError::InvalidConfiguration`]
    /// if a variable does not parse, is out of range, or the result fails
    /// [`validate`](Self::validate).
    ///
    /// | Variable                           | Meaning                     |
    /// | ---------------------------------- | --------------------------- |
    /// | `TURNSTILE_THROTTLE_ENABLED`       | `true` / `false`            |
    /// | `TURNSTILE_MAX_FAILED_ATTEMPTS`    | failures before blocking    |
    /// | `TURNSTILE_EXPIRY_WINDOW_SECS`     | record lifetime in seconds  |
    /// | `TURNSTILE_SWEEP_INTERVAL_MS`      | sweep cadence in millis     |
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();

        if let Some(enabled) = env_var::<bool>("TURNSTILE_THROTTLE_ENABLED")? {
            config.enabled = enabled;
        }
        if let Some(attempts) = env_var::<u32>("TURNSTILE_MAX_FAILED_ATTEMPTS")? {
            config.max_failed_attempts = attempts;
        }
        if let Some(secs) = env_var::<i64>("TURNSTILE_EXPIRY_WINDOW_SECS")? {
            config.expiry_window = Duration::try_seconds(secs).ok_or_else(|| {
                ValidationError::InvalidConfiguration(format!(
                    "TURNSTILE_EXPIRY_WINDOW_SECS is out of range: {secs}"
                ))
            })?;
        }
        if let Some(millis) = env_var::<u64>("TURNSTILE_SWEEP_INTERVAL_MS")? {
            config.sweep_interval = std::time::Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would never block, never expire, or push
    /// lockout deadlines past the range of a timestamp.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_failed_attempts == 0 {
            return Err(ValidationError::InvalidConfiguration(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if self.expiry_window <= Duration::zero() {
            return Err(ValidationError::InvalidConfiguration(
                "expiry_window must be positive".to_string(),
            ));
        }
        if self.expiry_window > MAX_EXPIRY_WINDOW {
            return Err(ValidationError::InvalidConfiguration(format!(
                "expiry_window must be at most {} days",
                MAX_EXPIRY_WINDOW.num_days()
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(ValidationError::InvalidConfiguration(
                "sweep_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ValidationError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ValidationError::InvalidConfiguration(format!("{name} has an invalid value: {raw}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Throttling state for a single identity, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub email: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    /// When the lockout lifts; only set while locked
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub fn unlocked(email: &str) -> Self {
        Self {
            email: email.to_string(),
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Seconds until the lockout lifts, measured against the system clock
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.retry_after_seconds_at(Utc::now())
    }

    pub fn retry_after_seconds_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .map(|until| (until - now).num_seconds().max(0))
    }
}
