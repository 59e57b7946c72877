//! In-memory alert cooldowns. Nothing here survives a restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-key cooldown for change alerts, keyed `<SYMBOL>USDT_<period>`.
///
/// The check and the update happen under one lock, so two evaluations of the
/// same key racing each other cannot both fire.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    last_fired: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        CooldownTracker {
            window,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Records `now` for `key` and returns true, unless the key fired less than
    /// one window ago.
    pub fn try_acquire(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = last_fired.get(key) {
            if now.signed_duration_since(*last) < self.window {
                return false;
            }
        }
        last_fired.insert(key.to_string(), now);
        true
    }

    pub fn last_fired(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_fired
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .copied()
    }
}

/// One shared gate for the whole batch of price alerts. It only advances after
/// a batch was actually delivered.
#[derive(Debug)]
pub struct PriceAlertGate {
    window: Duration,
    last_sent: Mutex<Option<DateTime<Utc>>>,
}

impl PriceAlertGate {
    pub fn new(window: Duration) -> Self {
        PriceAlertGate {
            window,
            last_sent: Mutex::new(None),
        }
    }

    /// Open when nothing was sent yet or strictly more than one window has passed.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_none()
    }

    /// Time left until the gate opens, `None` if it is already open.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last_sent = *self.last_sent.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = now.signed_duration_since(last_sent?);
        if elapsed > self.window {
            None
        } else {
            Some(self.window - elapsed)
        }
    }

    pub fn mark_sent(&self, now: DateTime<Utc>) {
        *self.last_sent.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
    }
}
