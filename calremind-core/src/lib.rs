//! Core types for the calremind ecosystem.
//!
//! This crate provides everything except delivery and presentation:
//! - `Event` and related types for calendar events with reminders
//! - `EventStore`, the in-memory collection with change notifications
//! - `Scheduler`, which fires each pending reminder exactly once
//! - the `Notifier` trait that delivery backends implement

pub mod error;
pub mod event;
pub mod notify;
pub mod scheduler;
pub mod store;

pub use error::{RemindError, RemindResult};
pub use event::{Event, EventDraft, EventId, ReminderState};
pub use notify::{LogNotifier, Notifier};
pub use scheduler::Scheduler;
pub use store::{EventStore, StoreObserver};
