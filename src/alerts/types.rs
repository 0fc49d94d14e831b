//! Alarm event types
//!
//! Every state transition the monitor reports becomes an [`AlarmEvent`]
//! carrying a severity and the final log message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Event severity, mapped onto syslog priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// State information (PSU inserted, thresholds rewritten)
    Info,
    /// Recovery or expected change
    Warning,
    /// Detection failure
    Error,
    /// Threshold violation or lost power
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Reading at or above the upper bound
    ExceededUpper,
    /// Reading at or below the lower bound
    ExceededLower,
    /// Reading back within bounds
    Recovered,
    /// PSU presence or power bits changed
    PsuStatus,
    /// PSU input type (AC/DC) changed
    InputType,
}

impl EventKind {
    /// Whether this event opens an alarm
    pub fn is_alarm(&self) -> bool {
        matches!(self, Self::ExceededUpper | Self::ExceededLower)
    }
}

/// A reported transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub severity: AlertSeverity,
    pub kind: EventKind,
    /// Display name of the device or measurement
    pub subject: String,
    pub message: String,
    pub timestamp: SystemTime,
}

impl AlarmEvent {
    pub fn new(
        severity: AlertSeverity,
        kind: EventKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            subject: subject.into(),
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }
}

impl fmt::Display for AlarmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Error);
        assert!(AlertSeverity::Error < AlertSeverity::Critical);
    }

    #[test]
    fn test_event_display() {
        let event = AlarmEvent::new(
            AlertSeverity::Critical,
            EventKind::ExceededLower,
            "PSU1 Input Voltage",
            "PSU1 Input Voltage exceeded lower critical, value is 85000, range is 90000~264000",
        );
        assert!(event.kind.is_alarm());
        assert!(event.to_string().starts_with("[CRITICAL] PSU1 Input Voltage"));
    }
}
