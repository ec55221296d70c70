use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::key::{MediaFormat, StorageKey};

/// Largest millisecond value [`KeyClock::observe`] accepts: the last
/// millisecond of year 9999. Anything above cannot be a capture time.
pub const MAX_OBSERVED_MS: u64 = 253_402_300_799_999;

/// Source of wall-clock milliseconds.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_ms(&self) -> u64;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Monotonic millisecond clock that issues storage keys.
///
/// Every tick is `max(wall_clock, last + 1)`, so two captures inside the same
/// millisecond (or across a backwards clock step) still receive distinct,
/// strictly increasing keys while keeping the `<millis>.<ext>` shape.
pub struct KeyClock {
    source: Box<dyn TimeSource>,
    /// Last issued (or observed) millisecond value.
    last_ms: Mutex<Option<u64>>,
}

impl KeyClock {
    /// A key clock driven by the system clock.
    pub fn system() -> Self {
        Self::with_source(SystemTimeSource)
    }

    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            last_ms: Mutex::new(None),
        }
    }

    /// Next strictly increasing millisecond value.
    pub fn tick(&self) -> u64 {
        let wall = self.source.now_ms();
        let mut last = self.last_ms.lock().unwrap_or_else(PoisonError::into_inner);
        let next = match *last {
            Some(prev) if wall <= prev => prev.saturating_add(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }

    /// Issue a fresh storage key in the given format.
    pub fn next_key(&self, format: &MediaFormat) -> StorageKey {
        StorageKey::from_millis(self.tick(), format)
    }

    /// Record a millisecond value issued elsewhere (e.g. by a previous
    /// process) so that later ticks never return it again.
    ///
    /// Values above [`MAX_OBSERVED_MS`] are ignored and `false` is returned;
    /// raising the floor that far would exhaust the key space.
    pub fn observe(&self, ms: u64) -> bool {
        if ms > MAX_OBSERVED_MS {
            return false;
        }
        let mut last = self.last_ms.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(last.map_or(ms, |prev| prev.max(ms)));
        true
    }

    /// Observe the timestamp embedded in an existing key, if any.
    pub fn observe_key(&self, key: &StorageKey) -> bool {
        key.millis().is_some_and(|ms| self.observe(ms))
    }
}

impl Default for KeyClock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for KeyClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = *self.last_ms.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("KeyClock").field("last_ms", &last).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;

    #[test]
    fn follows_wall_clock_when_it_advances() {
        let time = Arc::new(ManualTimeSource::new(1000));
        let clock = KeyClock::with_source(Arc::clone(&time));
        assert_eq!(clock.tick(), 1000);
        time.set(2000);
        assert_eq!(clock.tick(), 2000);
    }

    #[test]
    fn same_millisecond_bumps_by_one() {
        let clock = KeyClock::with_source(ManualTimeSource::new(5000));
        assert_eq!(clock.tick(), 5000);
        assert_eq!(clock.tick(), 5001);
        assert_eq!(clock.tick(), 5002);
    }

    #[test]
    fn backwards_step_stays_monotonic() {
        let time = Arc::new(ManualTimeSource::new(9000));
        let clock = KeyClock::with_source(Arc::clone(&time));
        assert_eq!(clock.tick(), 9000);
        time.set(100);
        assert_eq!(clock.tick(), 9001);
    }

    #[test]
    fn observe_pushes_floor_forward() {
        let clock = KeyClock::with_source(ManualTimeSource::new(1000));
        clock.observe_key(&StorageKey::new("4000.jpeg"));
        clock.observe(10); // lower values never move the floor back
        assert_eq!(clock.tick(), 4001);
    }

    #[test]
    fn observe_ignores_foreign_keys() {
        let clock = KeyClock::with_source(ManualTimeSource::new(1000));
        clock.observe_key(&StorageKey::new("cover.jpeg"));
        assert_eq!(clock.tick(), 1000);
    }

    #[test]
    fn observe_rejects_values_past_the_key_space() {
        let clock = KeyClock::with_source(ManualTimeSource::new(1000));
        assert!(!clock.observe_key(&StorageKey::new("18446744073709551615.jpeg")));
        assert!(!clock.observe(MAX_OBSERVED_MS + 1));
        assert_eq!(clock.tick(), 1000);
        assert_eq!(clock.tick(), 1001);

        assert!(clock.observe(MAX_OBSERVED_MS));
        assert_eq!(clock.tick(), MAX_OBSERVED_MS + 1);
    }

    #[test]
    fn next_key_formats_extension() {
        let clock = KeyClock::with_source(ManualTimeSource::new(1234));
        assert_eq!(clock.next_key(&MediaFormat::jpeg()).as_str(), "1234.jpeg");
    }

    #[test]
    fn system_clock_is_monotonic_across_rapid_calls() {
        let clock = KeyClock::system();
        let mut prev = clock.tick();
        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > prev, "key clock must be strictly monotonic: {prev} >= {next}");
            prev = next;
        }
    }

    proptest! {
        #[test]
        fn keys_strictly_increase_for_any_wall_clock(readings in proptest::collection::vec(0u64..10_000, 1..64)) {
            let time = Arc::new(ManualTimeSource::new(0));
            let clock = KeyClock::with_source(Arc::clone(&time));
            let mut prev: Option<u64> = None;
            for reading in readings {
                time.set(reading);
                let next = clock.tick();
                prop_assert!(next >= reading);
                if let Some(p) = prev {
                    prop_assert!(next > p);
                }
                prev = Some(next);
            }
        }
    }
}
