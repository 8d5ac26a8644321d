//! Desktop notification backend built on notify-rust.

use calremind_core::{Notifier, RemindError, RemindResult};
use notify_rust::Notification;

/// Delivers reminders as system notifications.
///
/// Failures (no notification daemon, permission denied) surface as
/// `RemindError::Delivery`; the scheduler logs them without breaking.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> RemindResult<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| RemindError::Delivery(e.to_string()))
    }
}
