//! Event types shared across the calremind crates.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable, opaque identifier for an event. Assigned by the store at
/// creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub(crate) fn new() -> Self {
        EventId(Uuid::new_v4())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery status of an event's reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderState {
    /// A timer is outstanding (or about to be registered) for this reminder.
    Pending,
    /// The reminder came due and the notifier was invoked.
    Fired,
    /// The event was removed (or the scheduler shut down) before the
    /// reminder came due. The notifier was never invoked.
    Cancelled,
}

impl ReminderState {
    /// Whether the reminder has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        self != ReminderState::Pending
    }
}

/// A calendar event with a scheduled reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Calendar date the event belongs to (used for display ordering).
    pub date: NaiveDate,
    /// Free-form description, non-empty.
    pub text: String,
    /// When the event itself takes place (display only).
    pub occurs_at: DateTime<Utc>,
    /// When the reminder must fire.
    pub remind_at: DateTime<Utc>,
    pub reminder_state: ReminderState,
}

/// User-supplied fields for a new event.
///
/// `id` and `reminder_state` are assigned by the store, so callers
/// cannot forge either.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub date: NaiveDate,
    pub text: String,
    pub occurs_at: DateTime<Utc>,
    pub remind_at: DateTime<Utc>,
}
