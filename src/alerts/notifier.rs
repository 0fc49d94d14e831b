//! Alarm notification channels
//!
//! Events are dispatched to every registered [`Notifier`]. The default
//! channel is the `log` facade; the monitor loop also writes to syslog so
//! violations land there at `LOG_CRIT`.

use super::types::{AlarmEvent, AlertSeverity};
use crate::error::{AppError, Result};

use std::io::Write;
use std::sync::Mutex;
use syslog::{Facility, Formatter3164, Logger, LoggerBackend};

/// Log target used for alarm events, so they can be filtered or routed
/// separately from diagnostics
pub const LOG_TARGET: &str = "power_monitor";

/// Notification channel trait
pub trait Notifier: Send + Sync {
    /// Deliver one event
    fn notify(&self, event: &AlarmEvent) -> Result<()>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// Writes events to the log sink at a level matching their severity
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Log level an event is written at
    pub fn level(severity: AlertSeverity) -> log::Level {
        match severity {
            AlertSeverity::Critical | AlertSeverity::Error => log::Level::Error,
            AlertSeverity::Warning => log::Level::Warn,
            AlertSeverity::Info => log::Level::Info,
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, event: &AlarmEvent) -> Result<()> {
        log::log!(target: LOG_TARGET, Self::level(event.severity), "{}", event);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Writes events to the local syslog daemon with their own priority
pub struct SyslogNotifier {
    logger: Mutex<Logger<LoggerBackend, Formatter3164>>,
}

impl SyslogNotifier {
    /// Connect to the local syslog socket as `power_monitor`
    pub fn connect() -> Result<Self> {
        let logger = syslog::unix(syslog_formatter())
            .map_err(|e| AppError::Notification(format!("syslog: {}", e)))?;
        Ok(Self {
            logger: Mutex::new(logger),
        })
    }
}

impl Notifier for SyslogNotifier {
    fn notify(&self, event: &AlarmEvent) -> Result<()> {
        let mut logger = self.logger.lock().unwrap_or_else(|e| e.into_inner());
        send(&mut logger, event.severity, &event.message)
            .map_err(|e| AppError::Notification(format!("syslog: {}", e)))
    }

    fn name(&self) -> &str {
        "syslog"
    }
}

fn syslog_formatter() -> Formatter3164 {
    Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: LOG_TARGET.to_string(),
        pid: std::process::id(),
    }
}

/// Critical → LOG_CRIT, Error → LOG_ERR, Warning → LOG_WARNING,
/// Info → LOG_INFO
fn send<W: Write>(
    logger: &mut Logger<W, Formatter3164>,
    severity: AlertSeverity,
    message: &str,
) -> std::result::Result<(), syslog::Error> {
    match severity {
        AlertSeverity::Critical => logger.crit(message),
        AlertSeverity::Error => logger.err(message),
        AlertSeverity::Warning => logger.warning(message),
        AlertSeverity::Info => logger.info(message),
    }
}

/// Dispatches events to all registered channels
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationManager {
    /// Create a manager with no channels
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Send an event to every channel; a failing channel does not stop the
    /// others
    pub fn notify_all(&self, event: &AlarmEvent) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event) {
                log::warn!("Failed to notify via {}: {}", notifier.name(), e);
            }
        }
    }

    /// Log channel plus syslog when the local socket is reachable
    pub fn system() -> Self {
        let mut manager = Self::default();
        match SyslogNotifier::connect() {
            Ok(notifier) => manager.add_notifier(Box::new(notifier)),
            Err(e) => log::warn!("Alarms will not reach syslog: {}", e),
        }
        manager
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        let mut manager = Self::new();
        manager.add_notifier(Box::new(LogNotifier::new()));
        manager
    }
}

impl std::fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.notifiers.iter().map(|n| n.name()).collect();
        f.debug_struct("NotificationManager")
            .field("notifiers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::EventKind;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};

    struct Collecting(Arc<Mutex<Vec<String>>>);

    impl Notifier for Collecting {
        fn notify(&self, event: &AlarmEvent) -> Result<()> {
            self.0.lock().unwrap().push(event.message.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "collecting"
        }
    }

    struct Broken;

    impl Notifier for Broken {
        fn notify(&self, _event: &AlarmEvent) -> Result<()> {
            Err(AppError::NoDevices)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn event() -> AlarmEvent {
        AlarmEvent::new(
            AlertSeverity::Warning,
            EventKind::Recovered,
            "PSU1 Input Voltage",
            "PSU1 Input Voltage is NORMAL, value is 120000, range is 90000~264000",
        )
    }

    #[test]
    fn test_levels() {
        assert_eq!(LogNotifier::level(AlertSeverity::Critical), log::Level::Error);
        assert_eq!(LogNotifier::level(AlertSeverity::Error), log::Level::Error);
        assert_eq!(LogNotifier::level(AlertSeverity::Warning), log::Level::Warn);
        assert_eq!(LogNotifier::level(AlertSeverity::Info), log::Level::Info);
    }

    fn syslog_line(severity: AlertSeverity) -> String {
        let mut logger = Logger {
            formatter: syslog_formatter(),
            backend: Vec::new(),
        };
        send(&mut logger, severity, "PSU1 Input Voltage exceeded lower critical").unwrap();
        String::from_utf8(logger.backend).unwrap()
    }

    #[test]
    fn test_syslog_priorities() {
        // LOG_DAEMON (3 << 3) plus the severity code
        assert!(syslog_line(AlertSeverity::Critical).starts_with("<26>"));
        assert!(syslog_line(AlertSeverity::Error).starts_with("<27>"));
        assert!(syslog_line(AlertSeverity::Warning).starts_with("<28>"));
        assert!(syslog_line(AlertSeverity::Info).starts_with("<30>"));
    }

    #[test]
    fn test_syslog_line_carries_process_and_message() {
        let line = syslog_line(AlertSeverity::Critical);
        assert!(line.contains("power_monitor["));
        assert!(line.ends_with("PSU1 Input Voltage exceeded lower critical"));
    }

    #[test]
    fn test_critical_and_error_stay_distinct_in_log_output() {
        let critical = AlarmEvent::new(
            AlertSeverity::Critical,
            EventKind::ExceededLower,
            "PSU1",
            "PSU1 Input Voltage exceeded lower critical",
        );
        let error = AlarmEvent::new(
            AlertSeverity::Error,
            EventKind::InputType,
            "PSU1",
            "PSU1 input type is UNKNOWN",
        );
        assert!(critical.to_string().starts_with("[CRITICAL]"));
        assert!(error.to_string().starts_with("[ERROR]"));
    }

    #[test]
    fn test_system_manager_keeps_log_channel() {
        let manager = NotificationManager::system();
        assert!(manager.notifier_count() >= 1);
        assert!(manager.notifier_count() <= 2);
    }

    #[test]
    fn test_default_has_log_channel() {
        let manager = NotificationManager::default();
        assert_eq!(manager.notifier_count(), 1);
        manager.notify_all(&event());
    }

    #[test]
    fn test_failing_channel_does_not_block_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut manager = NotificationManager::new();
        manager.add_notifier(Box::new(Broken));
        manager.add_notifier(Box::new(Collecting(Arc::clone(&seen))));

        manager.notify_all(&event());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
