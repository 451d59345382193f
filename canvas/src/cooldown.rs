//! Per-user placement cooldown.
//!
//! DESIGN
//! ======
//! The gate stores, per user id, the epoch millisecond at which the next
//! placement becomes allowed. It is advisory: the remote store enforces the
//! real limit. Times are passed in explicitly so the gate never reads a
//! clock and tests can step time freely.

#[cfg(test)]
#[path = "cooldown_test.rs"]
mod cooldown_test;

use std::collections::HashMap;

use crate::consts::COOLDOWN_MS;

#[derive(Debug, Clone)]
pub struct CooldownGate {
    ends: HashMap<String, i64>,
    duration_ms: i64,
}

impl CooldownGate {
    #[must_use]
    pub fn new() -> Self {
        Self::with_duration(COOLDOWN_MS)
    }

    #[must_use]
    pub fn with_duration(duration_ms: i64) -> Self {
        Self { ends: HashMap::new(), duration_ms }
    }

    /// Length of one cooldown in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Whether `user_id` may place at `now_ms`.
    #[must_use]
    pub fn can_place(&self, user_id: &str, now_ms: i64) -> bool {
        self.ends.get(user_id).is_none_or(|&end| now_ms >= end)
    }

    /// Epoch millisecond at which the user's cooldown ends, if one was ever set.
    #[must_use]
    pub fn cooldown_end(&self, user_id: &str) -> Option<i64> {
        self.ends.get(user_id).copied()
    }

    /// Start a full cooldown at `now_ms`. Returns the new end.
    pub fn start(&mut self, user_id: &str, now_ms: i64) -> i64 {
        let end = now_ms.saturating_add(self.duration_ms);
        self.ends.insert(user_id.to_owned(), end);
        end
    }

    /// Seed the cooldown from the store's record of the user's last placement.
    ///
    /// Only applies when `last_placed_ms + duration` is still in the future.
    /// Returns whether a cooldown is now active.
    pub fn seed_from_last_placement(&mut self, user_id: &str, last_placed_ms: i64, now_ms: i64) -> bool {
        let end = last_placed_ms.saturating_add(self.duration_ms);
        if end <= now_ms {
            return false;
        }
        self.ends
            .entry(user_id.to_owned())
            .and_modify(|current| *current = (*current).max(end))
            .or_insert(end);
        true
    }

    /// Milliseconds left before the user may place, never negative.
    #[must_use]
    pub fn remaining_ms(&self, user_id: &str, now_ms: i64) -> i64 {
        self.ends
            .get(user_id)
            .map_or(0, |&end| end.saturating_sub(now_ms).max(0))
    }

    /// Remaining cooldown in whole seconds, rounded up.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn remaining_secs(&self, user_id: &str, now_ms: i64) -> u64 {
        let ms = self.remaining_ms(user_id, now_ms);
        (ms.saturating_add(999) / 1000) as u64
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new()
    }
}
