//! Reminder delivery backends.

use tracing::info;

use crate::error::RemindResult;

/// Delivery channel for due reminders.
///
/// The scheduler depends on delivery only through this trait. Backends
/// may show system notifications, raise in-app alerts, or just log;
/// which one is used is a configuration choice, not something probed
/// at runtime.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> RemindResult<()>;
}

/// Backend that writes reminders to the log.
///
/// Used as the test/fallback backend when no delivery channel is
/// available.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> RemindResult<()> {
        info!(title, body, "reminder");
        Ok(())
    }
}
