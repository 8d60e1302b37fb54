//! Per-key cooldown tracking.
//!
//! The cooldown store is the one piece of mutable shared state the pipeline
//! owns. Its check-and-set runs under a single [`parking_lot::Mutex`], so
//! two concurrent invocations of the same command in the same scope can
//! never both observe "cooldown expired" and proceed. The lock brackets
//! only the map access; it is never held across handler execution.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Identifies one cooldown slot: a command within a scope, optionally
/// narrowed to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CooldownKey {
    command: String,
    scope: String,
    user: Option<String>,
}

/// Tracks the last acquisition time per (command, scope[, user]) key.
///
/// The slot is reserved *optimistically*: the pipeline acquires it before
/// running the handler, so a slow handler still blocks a second invocation
/// inside the same window.
#[derive(Default)]
pub struct CooldownTracker {
    slots: Mutex<HashMap<CooldownKey, Instant>>,
}

impl CooldownTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the cooldown slot for the given key.
    ///
    /// Returns `Err(remaining)` if the window has not elapsed since the
    /// last acquisition; a denial never refreshes the stored timestamp.
    /// A zero window always succeeds and stores nothing.
    pub fn try_acquire(
        &self,
        command: &str,
        scope: &str,
        user: Option<&str>,
        window: Duration,
    ) -> Result<(), Duration> {
        self.try_acquire_at(command, scope, user, window, Instant::now())
    }

    fn try_acquire_at(
        &self,
        command: &str,
        scope: &str,
        user: Option<&str>,
        window: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        if window.is_zero() {
            return Ok(());
        }

        let key = CooldownKey {
            command: command.to_string(),
            scope: scope.to_string(),
            user: user.map(str::to_string),
        };

        let mut slots = self.slots.lock();
        if let Some(&last) = slots.get(&key) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                return Err(window - elapsed);
            }
        }
        slots.insert(key, now);
        Ok(())
    }

    /// Returns the number of live cooldown slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns whether no slot has been acquired yet.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl std::fmt::Debug for CooldownTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownTracker")
            .field("slots", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    #[test]
    fn test_first_acquisition_succeeds() {
        let tracker = CooldownTracker::new();
        assert!(tracker.try_acquire("ping", "chan", None, WINDOW).is_ok());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_second_acquisition_within_window_is_denied() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker
            .try_acquire_at("ping", "chan", None, WINDOW, start)
            .unwrap();

        let remaining = tracker
            .try_acquire_at("ping", "chan", None, WINDOW, start + Duration::from_secs(2))
            .unwrap_err();
        assert_eq!(remaining, Duration::from_secs(3));
    }

    #[test]
    fn test_acquisition_after_window_elapses() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker
            .try_acquire_at("ping", "chan", None, WINDOW, start)
            .unwrap();

        assert!(
            tracker
                .try_acquire_at("ping", "chan", None, WINDOW, start + WINDOW)
                .is_ok()
        );
    }

    #[test]
    fn test_denial_does_not_refresh_the_slot() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker
            .try_acquire_at("ping", "chan", None, WINDOW, start)
            .unwrap();

        // Denied at t+4; the slot must still expire at t+5, not t+9.
        tracker
            .try_acquire_at("ping", "chan", None, WINDOW, start + Duration::from_secs(4))
            .unwrap_err();
        assert!(
            tracker
                .try_acquire_at("ping", "chan", None, WINDOW, start + WINDOW)
                .is_ok()
        );
    }

    #[test]
    fn test_keys_are_independent_per_scope_and_user() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        tracker
            .try_acquire_at("ping", "chan-a", None, WINDOW, now)
            .unwrap();

        assert!(
            tracker
                .try_acquire_at("ping", "chan-b", None, WINDOW, now)
                .is_ok()
        );
        assert!(
            tracker
                .try_acquire_at("ping", "chan-a", Some("alice"), WINDOW, now)
                .is_ok()
        );
        assert!(
            tracker
                .try_acquire_at("ping", "chan-a", Some("bob"), WINDOW, now)
                .is_ok()
        );
    }

    #[test]
    fn test_zero_window_never_blocks() {
        let tracker = CooldownTracker::new();
        assert!(
            tracker
                .try_acquire("ping", "chan", None, Duration::ZERO)
                .is_ok()
        );
        assert!(
            tracker
                .try_acquire("ping", "chan", None, Duration::ZERO)
                .is_ok()
        );
        assert!(tracker.is_empty());
    }
}
