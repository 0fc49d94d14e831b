//! Alarm reporting and notification
//!
//! Resolves display names, turns state transitions into events and
//! dispatches them to the log sink.

pub mod names;
mod notifier;
mod reporter;
mod types;

pub use notifier::{LogNotifier, NotificationManager, Notifier, LOG_TARGET};
pub use reporter::{AlarmReporter, DEFAULT_HISTORY_SIZE};
pub use types::{AlarmEvent, AlertSeverity, EventKind};
