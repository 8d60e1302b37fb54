//! An in-memory timer store, the demo's one stateful service.
//!
//! Handlers reach it through the context's service map; all methods return
//! `Result<_, String>` so command actions can forward failures straight
//! into an explained `CommandOutcome`.

use std::collections::HashMap;

use parking_lot::RwLock;

/// A recurring chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    /// Unique (per owner) timer name.
    pub name: String,
    /// Seconds between messages.
    pub interval_secs: u64,
    /// The message to send.
    pub message: String,
    /// Whether the timer is currently firing.
    pub enabled: bool,
}

/// Timers keyed by owning scope id, then by timer name.
#[derive(Default)]
pub struct TimerStore {
    timers: RwLock<HashMap<String, HashMap<String, Timer>>>,
}

impl TimerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a timer for the given owner.
    pub fn create(&self, owner: &str, timer: Timer) -> Result<(), String> {
        let mut timers = self.timers.write();
        let owned = timers.entry(owner.to_string()).or_default();
        if owned.contains_key(&timer.name) {
            return Err(format!("A timer named {} already exists", timer.name));
        }
        owned.insert(timer.name.clone(), timer);
        Ok(())
    }

    /// Removes a timer by name.
    pub fn delete(&self, owner: &str, name: &str) -> Result<(), String> {
        let mut timers = self.timers.write();
        let removed = timers
            .get_mut(owner)
            .and_then(|owned| owned.remove(name))
            .is_some();
        if removed {
            Ok(())
        } else {
            Err(format!("No timer named {name}"))
        }
    }

    /// Returns the owner's timers, sorted by name.
    pub fn list(&self, owner: &str) -> Vec<Timer> {
        let timers = self.timers.read();
        let mut owned: Vec<Timer> = timers
            .get(owner)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default();
        owned.sort_by(|a, b| a.name.cmp(&b.name));
        owned
    }

    /// Enables or disables a timer by name.
    pub fn set_enabled(&self, owner: &str, name: &str, enabled: bool) -> Result<(), String> {
        let mut timers = self.timers.write();
        match timers.get_mut(owner).and_then(|owned| owned.get_mut(name)) {
            Some(timer) => {
                timer.enabled = enabled;
                Ok(())
            }
            None => Err(format!("No timer named {name}")),
        }
    }
}
