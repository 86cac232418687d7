//! Per-channel circuit breaker.
//!
//! # States
//! - Available: the channel receives traffic
//! - Tripped: the channel is excluded from selection until its cooldown elapses
//!
//! # State Transitions
//! ```text
//! Available → Tripped: hard failure, or consecutive failures > failure_threshold
//! Tripped → Available: a recorded success (cooldown expiry alone does not flip the flag)
//! ```
//!
//! Every field is its own atomic. Readers may observe a freshly incremented
//! failure counter before the matching state flip; no cross-field atomicity
//! is provided.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default cooldown before a tripped channel may be retried.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// Default number of consecutive soft failures tolerated before tripping.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 10;

/// Sentinel for "never tripped".
const NEVER: u64 = u64::MAX;

/// Breaker state flag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Available = 0,
    Tripped = 1,
}

impl From<u8> for BreakerState {
    fn from(val: u8) -> Self {
        match val {
            1 => BreakerState::Tripped,
            _ => BreakerState::Available,
        }
    }
}

/// Tunables for a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// How long a tripped channel waits before it is allowed a retry.
    pub cooldown: Duration,
    /// Consecutive soft failures tolerated; the next one trips the breaker.
    pub failure_threshold: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Point-in-time view of a breaker, suitable for reporting or persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    /// Trip time in milliseconds since the Unix epoch.
    pub tripped_at_ms: Option<u64>,
    pub consecutive_failures: u32,
}

/// Lock-free breaker state machine embedded in every channel.
#[derive(Debug)]
pub struct Breaker {
    state: AtomicU8,
    tripped_at_ms: AtomicU64,
    consecutive_failures: AtomicU32,
    cooldown_ms: AtomicU64,
    failure_threshold: AtomicU32,
}

impl Default for Breaker {
    fn default() -> Self {
        Self::new(BreakerSettings::default())
    }
}

impl Breaker {
    /// Create an available breaker with zero failures.
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            state: AtomicU8::new(BreakerState::Available as u8),
            tripped_at_ms: AtomicU64::new(NEVER),
            consecutive_failures: AtomicU32::new(0),
            cooldown_ms: AtomicU64::new(duration_millis(settings.cooldown)),
            failure_threshold: AtomicU32::new(settings.failure_threshold),
        }
    }

    /// Apply settings and optionally restore a previously persisted snapshot.
    ///
    /// Only the trip time and failure counter are restored; the state is left
    /// as it is. Calling this again with the same arguments yields the same
    /// breaker.
    pub fn initialize(
        &self,
        settings: BreakerSettings,
        tripped_at: Option<SystemTime>,
        consecutive_failures: Option<u32>,
    ) {
        self.cooldown_ms
            .store(duration_millis(settings.cooldown), Ordering::Relaxed);
        self.failure_threshold
            .store(settings.failure_threshold, Ordering::Relaxed);

        if let Some(at) = tripped_at {
            let millis = at
                .duration_since(UNIX_EPOCH)
                .map(duration_millis)
                .unwrap_or(0);
            self.tripped_at_ms.store(millis, Ordering::Relaxed);
        }
        if let Some(failures) = consecutive_failures {
            self.consecutive_failures.store(failures, Ordering::Relaxed);
        }
    }

    pub fn state(&self) -> BreakerState {
        BreakerState::from(self.state.load(Ordering::Acquire))
    }

    /// True iff the state flag is `Available`.
    pub fn is_available(&self) -> bool {
        self.state() == BreakerState::Available
    }

    /// True iff the breaker is available or its cooldown window has elapsed.
    pub fn allows_request(&self) -> bool {
        self.is_available() || self.is_after_cooldown()
    }

    /// Reset all bookkeeping. Returns true if the breaker was tripped before.
    pub fn record_success(&self) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.tripped_at_ms.store(NEVER, Ordering::Relaxed);
        let prev = self
            .state
            .swap(BreakerState::Available as u8, Ordering::AcqRel);
        BreakerState::from(prev) == BreakerState::Tripped
    }

    /// Trip unconditionally and restart the cooldown window.
    /// Returns true if the breaker was available before.
    pub fn trip(&self) -> bool {
        self.tripped_at_ms.store(now_millis(), Ordering::Relaxed);
        let prev = self
            .state
            .swap(BreakerState::Tripped as u8, Ordering::AcqRel);
        BreakerState::from(prev) == BreakerState::Available
    }

    /// Count a soft failure and trip once the count exceeds the threshold.
    /// The counter is not reset by tripping. Returns true if this call
    /// moved the breaker from available to tripped.
    pub fn record_failure(&self) -> bool {
        let failures = self
            .consecutive_failures
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        if failures > self.failure_threshold.load(Ordering::Relaxed) {
            return self.trip();
        }
        false
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold.load(Ordering::Relaxed)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms.load(Ordering::Relaxed))
    }

    /// Time of the most recent trip, if any.
    pub fn tripped_at(&self) -> Option<SystemTime> {
        match self.tripped_at_ms.load(Ordering::Relaxed) {
            NEVER => None,
            millis => UNIX_EPOCH.checked_add(Duration::from_millis(millis)),
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let tripped_at_ms = match self.tripped_at_ms.load(Ordering::Relaxed) {
            NEVER => None,
            millis => Some(millis),
        };
        BreakerSnapshot {
            state: self.state(),
            tripped_at_ms,
            consecutive_failures: self.consecutive_failures(),
        }
    }

    fn is_after_cooldown(&self) -> bool {
        let tripped_at = self.tripped_at_ms.load(Ordering::Relaxed);
        if tripped_at == NEVER {
            return true;
        }
        let cooldown = self.cooldown_ms.load(Ordering::Relaxed);
        now_millis() > tripped_at.saturating_add(cooldown)
    }
}

pub(crate) fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_millis)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn breaker(cooldown_ms: u64, threshold: u32) -> Breaker {
        Breaker::new(BreakerSettings {
            cooldown: Duration::from_millis(cooldown_ms),
            failure_threshold: threshold,
        })
    }

    #[test]
    fn test_initial_state() {
        let b = Breaker::default();
        assert!(b.is_available());
        assert!(b.allows_request());
        assert_eq!(b.consecutive_failures(), 0);
        assert_eq!(b.tripped_at(), None);
        assert_eq!(b.cooldown(), DEFAULT_COOLDOWN);
        assert_eq!(b.failure_threshold(), DEFAULT_FAILURE_THRESHOLD);
    }

    #[test]
    fn test_trip_blocks_until_cooldown() {
        let b = breaker(50, 10);
        assert!(b.trip());
        assert!(!b.is_available());
        assert!(!b.allows_request());
        assert!(b.tripped_at().is_some());

        thread::sleep(Duration::from_millis(120));

        // Eligible again, but the flag only flips on success.
        assert!(b.allows_request());
        assert!(!b.is_available());
    }

    #[test]
    fn test_success_resets_everything() {
        let b = breaker(60_000, 2);
        for _ in 0..5 {
            b.record_failure();
        }
        assert!(!b.is_available());

        assert!(b.record_success());
        assert!(b.is_available());
        assert!(b.allows_request());
        assert_eq!(b.consecutive_failures(), 0);
        assert_eq!(b.tripped_at(), None);

        // Already available: no transition reported.
        assert!(!b.record_success());
    }

    #[test]
    fn test_threshold_exceeded_trips() {
        let b = breaker(60_000, 3);
        for _ in 0..3 {
            assert!(!b.record_failure());
        }
        assert!(b.is_available());

        assert!(b.record_failure());
        assert!(!b.is_available());
        assert_eq!(b.consecutive_failures(), 4);

        // Further failures keep counting and restart the cooldown.
        assert!(!b.record_failure());
        assert_eq!(b.consecutive_failures(), 5);
    }

    #[test]
    fn test_repeated_trip_reports_single_transition() {
        let b = Breaker::default();
        assert!(b.trip());
        assert!(!b.trip());
    }

    #[test]
    fn test_initialize_restores_snapshot() {
        let b = Breaker::default();
        let tripped_at = SystemTime::now();
        b.initialize(
            BreakerSettings {
                cooldown: Duration::from_secs(30),
                failure_threshold: 4,
            },
            Some(tripped_at),
            Some(7),
        );

        assert_eq!(b.cooldown(), Duration::from_secs(30));
        assert_eq!(b.failure_threshold(), 4);
        assert_eq!(b.consecutive_failures(), 7);
        assert_eq!(b.state(), BreakerState::Available);
        assert!(b.is_available());
        assert!(b.allows_request());

        let snapshot = b.snapshot();
        assert_eq!(snapshot.state, BreakerState::Available);
        assert_eq!(snapshot.consecutive_failures, 7);
        assert!(snapshot.tripped_at_ms.is_some());
    }

    #[test]
    fn test_restored_trip_time_governs_next_trip() {
        let b = Breaker::default();
        b.initialize(
            BreakerSettings {
                cooldown: Duration::from_secs(60),
                failure_threshold: 2,
            },
            Some(SystemTime::now()),
            Some(2),
        );
        assert!(b.is_available());

        // The restored counter is already at the threshold; one more trips.
        assert!(b.record_failure());
        assert_eq!(b.state(), BreakerState::Tripped);
        assert!(!b.allows_request());
    }

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_initialize_without_snapshot_keeps_state() {
        let b = Breaker::default();
        b.initialize(
            BreakerSettings {
                cooldown: Duration::from_secs(1),
                failure_threshold: 1,
            },
            None,
            None,
        );
        assert!(b.is_available());
        assert_eq!(b.consecutive_failures(), 0);
    }

    #[test]
    fn test_concurrent_failures_are_all_counted() {
        let b = Arc::new(breaker(60_000, 1_000_000));
        thread::scope(|s| {
            for _ in 0..8 {
                let b = b.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        b.record_failure();
                    }
                });
            }
        });
        assert_eq!(b.consecutive_failures(), 8000);
        assert!(b.is_available());
    }
}
