//! Down-counter state machine
//!
//! A record's only state is its `down` counter. Healthy checks walk it back
//! toward zero, unhealthy checks push it up until the revoke score is reached,
//! at which point the record is evicted instead.

use std::fmt;

/// Store write implied by one health evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Healthy and already at zero: no write
    None,
    /// Healthy with failures on record: `down -= 1`
    Decrement,
    /// Unhealthy below the threshold: `down += 1`
    Increment,
    /// Unhealthy at the threshold: delete the record
    Evict,
}

impl Transition {
    /// Decide the transition for a record currently at `down`
    ///
    /// # Examples
    ///
    /// ```
    /// use overlay_janitor::Transition;
    ///
    /// assert_eq!(Transition::decide(2, true, 3), Transition::Decrement);
    /// assert_eq!(Transition::decide(0, true, 3), Transition::None);
    /// assert_eq!(Transition::decide(1, false, 3), Transition::Increment);
    /// assert_eq!(Transition::decide(2, false, 3), Transition::Evict);
    /// ```
    pub fn decide(down: u32, healthy: bool, revoke_score: u32) -> Self {
        if healthy {
            if down > 0 {
                Transition::Decrement
            } else {
                Transition::None
            }
        } else if down.saturating_add(1) >= revoke_score {
            Transition::Evict
        } else {
            Transition::Increment
        }
    }

    /// Counter delta issued to the store, if any
    pub fn delta(&self) -> Option<i64> {
        match self {
            Transition::Decrement => Some(-1),
            Transition::Increment => Some(1),
            Transition::None | Transition::Evict => None,
        }
    }

    /// Counter value after the transition; `None` once evicted
    pub fn apply(&self, down: u32) -> Option<u32> {
        match self {
            Transition::None => Some(down),
            Transition::Decrement => Some(down.saturating_sub(1)),
            Transition::Increment => Some(down.saturating_add(1)),
            Transition::Evict => None,
        }
    }

    /// Short label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Decrement => "decrement",
            Transition::Increment => "increment",
            Transition::Evict => "evict",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
