//! Per-identity failed login tracking.
//!
//! The tracker keeps one [`AttemptRecord`] per identity that has failed to log
//! in recently. An identity is blocked once its failure count reaches the
//! configured threshold, and stays blocked until either a successful login
//! clears the record or the record ages past the expiry window.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_core::{ThrottleConfig, services::AttemptTracker};
//!
//! let tracker = AttemptTracker::new(ThrottleConfig::default());
//! let sweeper = tracker.start_sweep_task();
//!
//! if !tracker.is_blocked("user@example.com") {
//!     // verify credentials, then
//!     let status = tracker.record_failure("user@example.com");
//! }
//!
//! sweeper.shutdown().await;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::{
    clock::{Clock, SystemClock},
    throttle::{LockoutStatus, ThrottleConfig},
};

/// Failure state for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Consecutive failures since the last success or expiry
    pub failure_count: u32,
    /// Time of the most recent failure
    pub last_failure_at: DateTime<Utc>,
}

impl AttemptRecord {
    fn is_expired(&self, now: DateTime<Utc>, config: &ThrottleConfig) -> bool {
        now - self.last_failure_at >= config.expiry_window
    }
}

/// Tracks failed login attempts per identity.
///
/// # Thread Safety
///
/// Records live in a sharded concurrent map. Every mutation of a record happens
/// while holding the write lock of that record's shard, so concurrent failures
/// for the same identity never lose an increment. The sweep locks one shard at
/// a time and never blocks the whole table.
pub struct AttemptTracker {
    records: Arc<DashMap<String, AttemptRecord>>,
    config: ThrottleConfig,
    clock: Arc<dyn Clock>,
}

impl AttemptTracker {
    /// Create a tracker that reads time from the system clock.
    pub fn new(config: ThrottleConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether `identity` is currently blocked.
    ///
    /// True only for a live (unexpired) record at or above the threshold. Does
    /// not modify any state.
    pub fn is_blocked(&self, identity: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = self.clock.now();
        self.records.get(identity).is_some_and(|record| {
            record.failure_count >= self.config.max_failed_attempts
                && !record.is_expired(now, &self.config)
        })
    }

    /// Count a failed attempt and return the updated status.
    ///
    /// A record that has aged out but has not been swept yet is treated as
    /// absent, so the count restarts at 1.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identity (email) that failed to authenticate
    ///
    /// # Returns
    ///
    /// The [`LockoutStatus`] after counting this failure. `is_locked` is set
    /// on the failure that reaches the threshold.
    pub fn record_failure(&self, identity: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(identity);
        }

        let now = self.clock.now();
        let record = {
            let mut entry = self
                .records
                .entry(identity.to_string())
                .or_insert(AttemptRecord {
                    failure_count: 0,
                    last_failure_at: now,
                });

            if entry.is_expired(now, &self.config) {
                entry.failure_count = 0;
            }
            entry.failure_count = entry.failure_count.saturating_add(1);
            entry.last_failure_at = now;
            *entry
        };

        let status = self.status_from(identity, Some(record), now);
        if record.failure_count == self.config.max_failed_attempts {
            tracing::warn!(
                failed_attempts = record.failure_count,
                locked_until = ?status.locked_until,
                "Login throttled after repeated failures"
            );
        }
        status
    }

    /// Clear any failure state for `identity`. Idempotent.
    pub fn record_success(&self, identity: &str) {
        if self.records.remove(identity).is_some() {
            tracing::debug!("Cleared failed login attempts after successful login");
        }
    }

    /// Current throttling status for `identity`.
    pub fn lockout_status(&self, identity: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(identity);
        }

        let now = self.clock.now();
        let record = self.records.get(identity).map(|record| *record);
        self.status_from(identity, record, now)
    }

    /// Live failure count for `identity`; zero when absent or expired.
    pub fn failure_count(&self, identity: &str) -> u32 {
        self.lockout_status(identity).failed_attempts
    }

    /// Snapshot of the raw record, expired or not.
    pub fn record(&self, identity: &str) -> Option<AttemptRecord> {
        self.records.get(identity).map(|record| *record)
    }

    /// Administratively clear `identity`, returning whether it was blocked.
    pub fn unlock(&self, identity: &str) -> bool {
        let was_blocked = self.is_blocked(identity);
        self.records.remove(identity);
        if was_blocked {
            tracing::info!("Login throttle lifted by administrator");
        }
        was_blocked
    }

    /// Number of identities with a record, expired or not.
    pub fn tracked_identities(&self) -> usize {
        self.records.len()
    }

    /// Delete every record whose most recent failure is older than the expiry
    /// window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        sweep_expired(&self.records, self.clock.as_ref(), &self.config)
    }

    /// Spawn the background sweep on the current tokio runtime.
    ///
    /// The sweep runs every `sweep_interval` until the returned handle is shut
    /// down or dropped.
    ///
    /// # Returns
    ///
    /// A [`SweepHandle`] owning the spawned task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_sweep_task(&self) -> SweepHandle {
        let records = Arc::clone(&self.records);
        let clock = Arc::clone(&self.clock);
        let config = self.config.clone();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(config.sweep_interval);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = sweep_expired(&records, clock.as_ref(), &config);
                        if removed > 0 {
                            tracing::info!(
                                count = removed,
                                "Swept expired failed login attempt records"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Shutting down login throttle sweep task");
                        break;
                    }
                }
            }
        });

        SweepHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    fn status_from(
        &self,
        identity: &str,
        record: Option<AttemptRecord>,
        now: DateTime<Utc>,
    ) -> LockoutStatus {
        let Some(record) = record.filter(|r| !r.is_expired(now, &self.config)) else {
            return LockoutStatus::unlocked(identity);
        };

        let is_locked = record.failure_count >= self.config.max_failed_attempts;
        LockoutStatus {
            email: identity.to_string(),
            failed_attempts: record.failure_count,
            is_locked,
            locked_until: is_locked
                .then(|| {
                    record
                        .last_failure_at
                        .checked_add_signed(self.config.expiry_window)
                })
                .flatten(),
        }
    }
}

fn sweep_expired(
    records: &DashMap<String, AttemptRecord>,
    clock: &dyn Clock,
    config: &ThrottleConfig,
) -> usize {
    let now = clock.now();
    let mut removed = 0;
    records.retain(|_, record| {
        let keep = !record.is_expired(now, config);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

/// Handle to a running sweep task.
///
/// Dropping the handle also stops the task, on its next wake-up.
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Login throttle sweep task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;

    fn tracker() -> (AttemptTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let tracker = AttemptTracker::with_clock(ThrottleConfig::default(), clock.clone());
        (tracker, clock)
    }

    #[test]
    fn test_not_blocked_initially() {
        let (tracker, _) = tracker();
        assert!(!tracker.is_blocked("a@x.com"));
        assert_eq!(tracker.failure_count("a@x.com"), 0);
        assert_eq!(tracker.tracked_identities(), 0);
    }

    #[test]
    fn test_not_blocked_after_four_failures() {
        let (tracker, _) = tracker();
        for _ in 0..4 {
            tracker.record_failure("a@x.com");
        }
        assert!(!tracker.is_blocked("a@x.com"));
        assert_eq!(tracker.failure_count("a@x.com"), 4);
    }

    #[test]
    fn test_blocked_after_five_failures() {
        let (tracker, _) = tracker();
        for attempt in 1..=4 {
            let status = tracker.record_failure("a@x.com");
            assert_eq!(status.failed_attempts, attempt);
            assert!(!status.is_locked);
        }

        let status = tracker.record_failure("a@x.com");
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 5);
        assert!(status.locked_until.is_some());
        assert!(tracker.is_blocked("a@x.com"));
    }

    #[test]
    fn test_is_blocked_does_not_mutate() {
        let (tracker, _) = tracker();
        tracker.record_failure("a@x.com");
        let before = tracker.record("a@x.com");
        assert!(!tracker.is_blocked("a@x.com"));
        assert!(!tracker.is_blocked("other@x.com"));
        assert_eq!(tracker.record("a@x.com"), before);
        assert_eq!(tracker.tracked_identities(), 1);
    }

    #[test]
    fn test_success_resets_count() {
        let (tracker, _) = tracker();
        for _ in 0..3 {
            tracker.record_failure("b@x.com");
        }
        tracker.record_success("b@x.com");
        assert!(tracker.record("b@x.com").is_none());

        let status = tracker.record_failure("b@x.com");
        assert_eq!(status.failed_attempts, 1);
    }

    #[test]
    fn test_record_success_is_idempotent() {
        let (tracker, _) = tracker();
        tracker.record_success("nobody@x.com");
        tracker.record_success("nobody@x.com");
        assert_eq!(tracker.tracked_identities(), 0);
    }

    #[test]
    fn test_last_failure_at_tracks_clock() {
        let (tracker, clock) = tracker();
        tracker.record_failure("a@x.com");
        clock.advance(Duration::minutes(5));
        tracker.record_failure("a@x.com");

        let record = tracker.record("a@x.com").unwrap();
        assert_eq!(record.failure_count, 2);
        assert_eq!(record.last_failure_at, clock.now());
    }

    #[test]
    fn test_expired_record_stops_blocking_before_sweep() {
        let (tracker, clock) = tracker();
        for _ in 0..5 {
            tracker.record_failure("a@x.com");
        }
        assert!(tracker.is_blocked("a@x.com"));

        clock.advance(Duration::minutes(29));
        assert!(tracker.is_blocked("a@x.com"));

        clock.advance(Duration::minutes(1));
        assert!(!tracker.is_blocked("a@x.com"));
        assert_eq!(tracker.failure_count("a@x.com"), 0);
    }

    #[test]
    fn test_failure_after_expiry_starts_fresh() {
        let (tracker, clock) = tracker();
        for _ in 0..5 {
            tracker.record_failure("a@x.com");
        }
        clock.advance(Duration::minutes(31));

        let status = tracker.record_failure("a@x.com");
        assert_eq!(status.failed_attempts, 1);
        assert!(!status.is_locked);
    }

    #[test]
    fn test_sweep_removes_only_expired_records() {
        let (tracker, clock) = tracker();
        for _ in 0..5 {
            tracker.record_failure("old@x.com");
        }
        clock.advance(Duration::minutes(20));
        tracker.record_failure("fresh@x.com");
        clock.advance(Duration::minutes(10));

        assert_eq!(tracker.sweep(), 1);
        assert!(tracker.record("old@x.com").is_none());
        assert!(tracker.record("fresh@x.com").is_some());
        assert!(!tracker.is_blocked("old@x.com"));
    }

    #[test]
    fn test_different_identities_tracked_separately() {
        let (tracker, _) = tracker();
        for _ in 0..5 {
            tracker.record_failure("user1@x.com");
        }
        assert!(tracker.is_blocked("user1@x.com"));
        assert!(!tracker.is_blocked("user2@x.com"));
        assert_eq!(tracker.failure_count("user2@x.com"), 0);
    }

    #[test]
    fn test_unlock_returns_was_blocked() {
        let (tracker, _) = tracker();
        for _ in 0..5 {
            tracker.record_failure("a@x.com");
        }
        assert!(tracker.unlock("a@x.com"));
        assert!(!tracker.is_blocked("a@x.com"));
        assert!(!tracker.unlock("a@x.com"));
    }

    #[test]
    fn test_disabled_tracker_records_nothing() {
        let tracker = AttemptTracker::new(ThrottleConfig::disabled());
        for _ in 0..10 {
            let status = tracker.record_failure("a@x.com");
            assert!(!status.is_locked);
            assert_eq!(status.failed_attempts, 0);
        }
        assert!(!tracker.is_blocked("a@x.com"));
        assert_eq!(tracker.tracked_identities(), 0);
    }

    #[test]
    fn test_lock_deadline_past_timestamp_range_is_unknown() {
        let config = ThrottleConfig::default()
            .max_failed_attempts(1)
            .expiry_window(Duration::seconds(9_000_000_000_000));
        let tracker = AttemptTracker::new(config);

        let status = tracker.record_failure("a@x.com");
        assert!(status.is_locked);
        assert!(status.locked_until.is_none());
        assert!(tracker.is_blocked("a@x.com"));
    }

    #[test]
    fn test_custom_threshold() {
        let tracker = AttemptTracker::new(ThrottleConfig::default().max_failed_attempts(2));
        tracker.record_failure("a@x.com");
        assert!(!tracker.is_blocked("a@x.com"));
        assert!(tracker.record_failure("a@x.com").is_locked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_not_lost() {
        let config = ThrottleConfig::default().max_failed_attempts(1_000);
        let tracker = Arc::new(AttemptTracker::new(config));

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move {
                    tracker.record_failure("a@x.com");
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tracker.failure_count("a@x.com"), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_reclaims_expired_records() {
        let (tracker, clock) = tracker();
        for _ in 0..5 {
            tracker.record_failure("a@x.com");
        }
        let sweeper = tracker.start_sweep_task();

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(tracker.tracked_identities(), 1);

        clock.advance(Duration::minutes(30));
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(tracker.tracked_identities(), 0);

        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_on_shutdown() {
        let (tracker, clock) = tracker();
        let sweeper = tracker.start_sweep_task();
        sweeper.shutdown().await;

        tracker.record_failure("a@x.com");
        clock.advance(Duration::hours(1));
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;

        assert_eq!(tracker.tracked_identities(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_when_handle_dropped() {
        let (tracker, _) = tracker();
        let sweeper = tracker.start_sweep_task();
        let probe = sweeper.task.abort_handle();
        drop(sweeper);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(probe.is_finished());
    }
}
