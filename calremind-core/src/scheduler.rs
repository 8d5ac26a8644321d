//! Reminder scheduling over the event store.
//!
//! The scheduler keeps one tokio timer per pending reminder and
//! guarantees each reminder fires at most once, at (or immediately
//! after) its `remind_at`, across any sequence of store changes.
//! Reminders that are already past due when their event is added are
//! resolved synchronously, without a timer, so they are never silently
//! dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::{Event, EventId, ReminderState};
use crate::notify::Notifier;
use crate::store::{EventStore, StoreObserver};

const REMINDER_TITLE: &str = "Event Reminder";

/// Scheduler-side record of one event's reminder.
struct ReminderEntry {
    state: ReminderState,
    /// Outstanding timer task; present only while `Pending` with a
    /// future `remind_at`.
    timer: Option<JoinHandle<()>>,
}

struct SchedulerInner {
    entries: HashMap<EventId, ReminderEntry>,
}

/// Watches an [`EventStore`] and fires each pending reminder exactly once.
///
/// All state transitions serialize through one mutex; timer tasks are
/// the only source of asynchronous resumption and never hold the lock
/// across an await. Must be used within a tokio runtime.
pub struct Scheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    store: EventStore,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    /// Create a scheduler and subscribe it to the store's changes.
    ///
    /// Events already in the store are reconciled immediately.
    pub fn attach(store: EventStore, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        let scheduler = Arc::new(Scheduler {
            inner: Arc::new(Mutex::new(SchedulerInner {
                entries: HashMap::new(),
            })),
            store: store.clone(),
            notifier,
        });

        let observer: Weak<dyn StoreObserver> =
            Arc::downgrade(&(scheduler.clone() as Arc<dyn StoreObserver>));
        store.subscribe(observer);
        scheduler.reconcile(&store.snapshot());

        scheduler
    }

    /// The scheduler's view of an event's reminder.
    ///
    /// For a removed event the outcome stays visible until the next
    /// store change reconciles, after which its entry is pruned and
    /// this returns `None`.
    pub fn reminder_state(&self, id: EventId) -> Option<ReminderState> {
        self.lock().entries.get(&id).map(|entry| entry.state)
    }

    /// Cancel every outstanding timer. Also runs on drop.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        for (id, entry) in inner.entries.iter_mut() {
            if entry.state == ReminderState::Pending {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                entry.state = ReminderState::Cancelled;
                debug!(%id, "reminder cancelled at shutdown");
            }
        }
    }

    /// Align the timer table with the store's current contents.
    ///
    /// Edits are modeled as remove-then-add at the store level, so the
    /// diff here is purely by id: a live timer is never mutated in
    /// place.
    fn reconcile(&self, events: &[Event]) {
        // Past-due events resolve synchronously. They are collected
        // under the lock and delivered after it is released, in store
        // (insertion) order.
        let mut due = Vec::new();
        {
            let mut inner = self.lock();
            let present: HashSet<EventId> = events.iter().map(|e| e.id).collect();

            // Events gone from the store: cancel before this change
            // notification returns, so a stale timer cannot fire later.
            let mut cancelled_now = HashSet::new();
            for (id, entry) in inner.entries.iter_mut() {
                if entry.state == ReminderState::Pending && !present.contains(id) {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    entry.state = ReminderState::Cancelled;
                    cancelled_now.insert(*id);
                    debug!(%id, "reminder cancelled");
                }
            }

            // Terminal entries for events no longer in the store are
            // dead weight. Keep only the ones that transitioned in this
            // pass, so the outcome stays queryable through the change
            // notification that caused it; ids are never reused, so
            // pruning cannot re-register anything.
            inner
                .entries
                .retain(|id, _| present.contains(id) || cancelled_now.contains(id));

            // New events: register a timer, or resolve now if already due.
            for event in events {
                if inner.entries.contains_key(&event.id) {
                    continue;
                }
                match (event.remind_at - Utc::now()).to_std() {
                    Ok(delay) if !delay.is_zero() => {
                        let timer = self.spawn_timer(event, delay);
                        inner.entries.insert(
                            event.id,
                            ReminderEntry {
                                state: ReminderState::Pending,
                                timer: Some(timer),
                            },
                        );
                        debug!(id = %event.id, ?delay, "reminder scheduled");
                    }
                    // Non-positive delay: resolving synchronously avoids
                    // a zero-delay timer race.
                    _ => {
                        inner.entries.insert(
                            event.id,
                            ReminderEntry {
                                state: ReminderState::Fired,
                                timer: None,
                            },
                        );
                        debug!(id = %event.id, "reminder already due, resolving now");
                        due.push(event.clone());
                    }
                }
            }
        }

        for event in due {
            self.store.mark_reminder(event.id, ReminderState::Fired);
            deliver(self.notifier.as_ref(), &event);
        }
    }

    fn spawn_timer(&self, event: &Event, delay: std::time::Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let store = self.store.clone();
        let notifier = Arc::clone(&self.notifier);
        // Delivery uses the copy captured at registration: ids are
        // never reused and events are immutable per id, so a remove
        // racing in after the Fired transition cannot leave a fired
        // reminder undelivered.
        let event = event.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // The event may have been cancelled while we slept; the
            // check and the transition happen under the same lock, so a
            // late-running task for a cancelled reminder backs off here.
            let fire = {
                let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
                match guard.entries.get_mut(&event.id) {
                    Some(entry) if entry.state == ReminderState::Pending => {
                        entry.state = ReminderState::Fired;
                        entry.timer = None;
                        true
                    }
                    _ => false,
                }
            };

            if fire {
                store.mark_reminder(event.id, ReminderState::Fired);
                deliver(notifier.as_ref(), &event);
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StoreObserver for Scheduler {
    fn on_change(&self, events: &[Event]) {
        self.reconcile(events);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Invoke the notifier for a due reminder.
///
/// Delivery failure is a notifier-layer concern: it is logged and does
/// not affect the `Fired` transition that already happened.
fn deliver(notifier: &dyn Notifier, event: &Event) {
    let body = format!(
        "Reminder: {} at {}",
        event.text,
        event.occurs_at.format("%H:%M:%S")
    );
    match notifier.notify(REMINDER_TITLE, &body) {
        Ok(()) => debug!(id = %event.id, "reminder delivered"),
        Err(err) => warn!(id = %event.id, error = %err, "reminder delivery failed"),
    }
}
