//! Time Provider Abstraction
//!
//! Provides a trait-based abstraction for time operations so `created_at`
//! assignment and placeholder timestamps can be tested deterministically.
//!
//! # Examples
//!
//! ```rust
//! use notespace_core::models::time::{MonotonicClock, TimeProvider, SystemTimeProvider};
//! use std::sync::Arc;
//!
//! let clock = MonotonicClock::new(Arc::new(SystemTimeProvider));
//! let first = clock.next();
//! let second = clock.next();
//! assert!(second > first);
//! ```

use chrono::{DateTime, Duration, Timelike, Utc};
use std::sync::{Arc, Mutex};

/// Trait for providing current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider using actual system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven time provider
///
/// Shared through `Arc`, so a test can hand it to a store or controller and
/// keep advancing it from the outside.
///
/// ```rust
/// use notespace_core::models::time::{ManualTimeProvider, TimeProvider};
/// use chrono::{Duration, Utc};
///
/// let provider = ManualTimeProvider::with_time(Utc::now());
/// let before = provider.now();
/// provider.advance(Duration::hours(1));
/// assert_eq!(provider.now() - before, Duration::hours(1));
/// ```
#[derive(Debug)]
pub struct ManualTimeProvider {
    current_time: Mutex<DateTime<Utc>>,
}

impl ManualTimeProvider {
    pub fn with_time(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Mutex::new(time),
        }
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.lock() = time;
    }

    pub fn advance(&self, duration: Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualTimeProvider {
    fn default() -> Self {
        Self::with_time(Utc::now())
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Drop sub-microsecond precision (the storage format keeps six digits)
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros_only = ts.nanosecond() / 1_000 * 1_000;
    ts.with_nanosecond(micros_only).unwrap_or(ts)
}

/// Clock that never hands out the same instant twice
///
/// Each call to [`MonotonicClock::next`] returns a microsecond-precision
/// timestamp strictly greater than every previous one, even when the wall
/// clock stalls or steps backwards. Notes created in the same microsecond
/// therefore still get distinct `created_at` values, which keeps timestamp
/// cursors exact.
pub struct MonotonicClock {
    provider: Arc<dyn TimeProvider>,
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new(provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            provider,
            last_issued: Mutex::new(None),
        }
    }

    /// Raise the floor to an already-issued timestamp (e.g. newest persisted row)
    pub fn seed(&self, floor: DateTime<Utc>) {
        let floor = truncate_to_micros(floor);
        let mut last = self.lock();
        if (*last).map_or(true, |prev| floor > prev) {
            *last = Some(floor);
        }
    }

    pub fn next(&self) -> DateTime<Utc> {
        let now = truncate_to_micros(self.provider.now());
        let mut last = self.lock();

        let issued = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };

        *last = Some(issued);
        issued
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        self.last_issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MonotonicClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonotonicClock")
            .field("last_issued", &*self.lock())
            .finish()
    }
}
