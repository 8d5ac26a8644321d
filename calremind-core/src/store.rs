//! In-memory event store with change notifications.

use std::sync::{Arc, Mutex, Weak};

use crate::error::{RemindError, RemindResult};
use crate::event::{Event, EventDraft, EventId, ReminderState};

/// Observer of store membership changes.
///
/// `on_change` is invoked synchronously after every add/remove, outside
/// the store's internal lock, with a snapshot of all events in
/// insertion order.
pub trait StoreObserver: Send + Sync {
    fn on_change(&self, events: &[Event]);
}

struct StoreInner {
    events: Vec<Event>,
    observers: Vec<Weak<dyn StoreObserver>>,
}

/// Shared handle to the authoritative set of events.
///
/// Clones share the same underlying collection. Reminder resolution is
/// written back through [`EventStore::mark_reminder`] and does not
/// count as a membership change.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl EventStore {
    pub fn new() -> Self {
        EventStore {
            inner: Arc::new(Mutex::new(StoreInner {
                events: Vec::new(),
                observers: Vec::new(),
            })),
        }
    }

    /// Register an observer for membership changes.
    ///
    /// Observers are held weakly; the caller keeps the observer alive.
    pub fn subscribe(&self, observer: Weak<dyn StoreObserver>) {
        self.lock().observers.push(observer);
    }

    /// Validate and append a new event, then notify observers.
    ///
    /// The event enters with `reminder_state = Pending`; it is the
    /// scheduler's job to resolve it from there.
    pub fn add(&self, draft: EventDraft) -> RemindResult<EventId> {
        if draft.text.trim().is_empty() {
            return Err(RemindError::Validation(
                "event description must not be empty".to_string(),
            ));
        }

        let id = EventId::new();
        let event = Event {
            id,
            date: draft.date,
            text: draft.text,
            occurs_at: draft.occurs_at,
            remind_at: draft.remind_at,
            reminder_state: ReminderState::Pending,
        };

        let (snapshot, observers) = {
            let mut inner = self.lock();
            inner.events.push(event);
            (inner.events.clone(), Self::live_observers(&mut inner))
        };
        Self::notify_observers(&observers, &snapshot);

        Ok(id)
    }

    /// Remove an event if present, then notify observers.
    ///
    /// Removing an unknown id is a no-op, not an error.
    pub fn remove(&self, id: EventId) {
        let changed = {
            let mut inner = self.lock();
            let before = inner.events.len();
            inner.events.retain(|e| e.id != id);
            if inner.events.len() == before {
                None
            } else {
                Some((inner.events.clone(), Self::live_observers(&mut inner)))
            }
        };

        if let Some((snapshot, observers)) = changed {
            Self::notify_observers(&observers, &snapshot);
        }
    }

    /// Fresh snapshot of all events sorted by date ascending, with
    /// insertion order preserved among equal dates.
    pub fn list(&self) -> Vec<Event> {
        let mut events = self.lock().events.clone();
        events.sort_by_key(|e| e.date);
        events
    }

    /// Fresh snapshot in insertion order.
    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Look up a single event by id.
    pub fn get(&self, id: EventId) -> Option<Event> {
        self.lock().events.iter().find(|e| e.id == id).cloned()
    }

    /// Record a terminal reminder state for an event still in the store.
    ///
    /// No observer notification is emitted: reminder resolution is not
    /// a membership change, and emitting one would make the scheduler's
    /// reconciliation re-entrant.
    pub(crate) fn mark_reminder(&self, id: EventId, state: ReminderState) {
        let mut inner = self.lock();
        if let Some(event) = inner.events.iter_mut().find(|e| e.id == id) {
            event.reminder_state = state;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Upgrade registered observers, pruning any that have been dropped.
    fn live_observers(inner: &mut StoreInner) -> Vec<Arc<dyn StoreObserver>> {
        inner.observers.retain(|o| o.strong_count() > 0);
        inner.observers.iter().filter_map(Weak::upgrade).collect()
    }

    fn notify_observers(observers: &[Arc<dyn StoreObserver>], snapshot: &[Event]) {
        for observer in observers {
            observer.on_change(snapshot);
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        EventStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn draft(text: &str, date: NaiveDate) -> EventDraft {
        EventDraft {
            date,
            text: text.to_string(),
            occurs_at: Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap(),
            remind_at: Utc.with_ymd_and_hms(2026, 3, 20, 9, 45, 0).unwrap(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl StoreObserver for CountingObserver {
        fn on_change(&self, _events: &[Event]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_assigns_id_and_pending_state() {
        let store = EventStore::new();
        let id = store.add(draft("Standup", day(20))).unwrap();

        let event = store.get(id).unwrap();
        assert_eq!(event.text, "Standup");
        assert_eq!(event.reminder_state, ReminderState::Pending);
    }

    #[test]
    fn add_rejects_empty_description() {
        let store = EventStore::new();

        let err = store.add(draft("", day(20))).unwrap_err();
        assert!(matches!(err, RemindError::Validation(_)));

        let err = store.add(draft("   ", day(20))).unwrap_err();
        assert!(matches!(err, RemindError::Validation(_)));

        assert!(store.list().is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = EventStore::new();
        let id = store.add(draft("Standup", day(20))).unwrap();

        store.remove(id);
        assert!(store.get(id).is_none());

        // Second remove of the same id is a no-op.
        store.remove(id);
        assert!(store.list().is_empty());
    }

    #[test]
    fn list_sorts_by_date_with_stable_ties() {
        let store = EventStore::new();
        let c = store.add(draft("third", day(25))).unwrap();
        let a = store.add(draft("first-tie", day(21))).unwrap();
        let b = store.add(draft("second-tie", day(21))).unwrap();
        // Earlier date added last still sorts first.
        let d = store.add(draft("earliest", day(3))).unwrap();

        let ids: Vec<EventId> = store.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![d, a, b, c]);
    }

    #[test]
    fn list_returns_isolated_snapshot() {
        let store = EventStore::new();
        store.add(draft("one", day(20))).unwrap();

        let snapshot = store.list();
        store.add(draft("two", day(21))).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn observers_see_adds_and_removes_but_not_reminder_marks() {
        let store = EventStore::new();
        let observer = Arc::new(CountingObserver {
            calls: AtomicUsize::new(0),
        });
        let weak: Weak<dyn StoreObserver> =
            Arc::downgrade(&(observer.clone() as Arc<dyn StoreObserver>));
        store.subscribe(weak);

        let id = store.add(draft("Standup", day(20))).unwrap();
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);

        store.mark_reminder(id, ReminderState::Fired);
        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);

        store.remove(id);
        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);

        // Removing an absent id emits no notification.
        store.remove(id);
        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn mark_reminder_updates_state_in_place() {
        let store = EventStore::new();
        let id = store.add(draft("Standup", day(20))).unwrap();

        store.mark_reminder(id, ReminderState::Fired);
        assert_eq!(store.get(id).unwrap().reminder_state, ReminderState::Fired);

        // Marking an absent id is a no-op.
        store.remove(id);
        store.mark_reminder(id, ReminderState::Cancelled);
        assert!(store.get(id).is_none());
    }
}
