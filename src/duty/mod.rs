//! Weekly duty rotation.
//!
//! The roster maps each weekday to the set of people on duty that day. It is
//! built once at startup from configuration and never mutated afterwards; an
//! empty slot is legal and means nobody is notified that day.
//!
//! Slots are indexed by [`chrono::Weekday`] (Sunday = slot 0 through
//! Saturday = slot 6), so an out-of-range day cannot be expressed.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A notification recipient (an email address or alias).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(pub String);

impl Recipient {
    pub fn new(s: impl Into<String>) -> Self {
        Recipient(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Recipient {
    fn from(s: &str) -> Self {
        Recipient(s.to_string())
    }
}

/// The seven duty slots, Sunday through Saturday.
///
/// Read-only after construction. [`DutyRoster::recipients_for`] has no error
/// path: the weekday type is closed, so every day maps to exactly one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyRoster {
    slots: [Vec<Recipient>; 7],
}

impl DutyRoster {
    /// Builds a roster from seven slots ordered Sunday..Saturday.
    pub fn new(slots: [Vec<Recipient>; 7]) -> Self {
        DutyRoster { slots }
    }

    /// Builds a roster with every slot empty.
    pub fn empty() -> Self {
        DutyRoster {
            slots: Default::default(),
        }
    }

    /// Returns the recipients on duty for the given day, in authored order.
    pub fn recipients_for(&self, day: Weekday) -> &[Recipient] {
        &self.slots[day.num_days_from_sunday() as usize]
    }

    /// Returns true if no slot has any recipient.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_empty())
    }
}
