//! Edge-triggered alarm reporting
//!
//! A record only produces an event when its classification crosses between
//! alarm and valid. Repeated violations stay silent until the record
//! recovers.

use super::notifier::NotificationManager;
use super::types::{AlarmEvent, AlertSeverity, EventKind};
use crate::domain::{AlarmRecord, Classification};
use std::collections::VecDeque;

/// Default number of events kept for the query interface
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Turns classifications into events and dispatches them
#[derive(Debug)]
pub struct AlarmReporter {
    notifications: NotificationManager,
    history: VecDeque<AlarmEvent>,
    history_size: usize,
}

impl AlarmReporter {
    pub fn new(notifications: NotificationManager, history_size: usize) -> Self {
        Self {
            notifications,
            history: VecDeque::with_capacity(history_size.min(DEFAULT_HISTORY_SIZE)),
            history_size,
        }
    }

    /// Account one classification of `record`, known as `name` in messages.
    ///
    /// Returns the event emitted for a transition, if any.
    pub fn report(
        &mut self,
        name: &str,
        record: &mut AlarmRecord,
        classification: Classification,
    ) -> Option<AlarmEvent> {
        record.set_last(classification);

        let range = format!("{}~{}", record.min(), record.max());
        let value = record.reading();

        let event = match classification {
            alarm if alarm.is_alarm() && !record.is_failing() => {
                record.set_failing(true);
                let (kind, side) = if classification == Classification::AboveMax {
                    (EventKind::ExceededUpper, "upper")
                } else {
                    (EventKind::ExceededLower, "lower")
                };
                AlarmEvent::new(
                    AlertSeverity::Critical,
                    kind,
                    name,
                    format!(
                        "{} exceeded {} critical, value is {}, range is {}",
                        name, side, value, range
                    ),
                )
            }
            Classification::Valid if record.is_failing() => {
                record.set_failing(false);
                AlarmEvent::new(
                    AlertSeverity::Warning,
                    EventKind::Recovered,
                    name,
                    format!("{} is NORMAL, value is {}, range is {}", name, value, range),
                )
            }
            Classification::Error => {
                log::debug!(
                    "{}: cannot classify, value is {}, range is {}",
                    name,
                    value,
                    range
                );
                return None;
            }
            _ => return None,
        };

        self.emit(event.clone());
        Some(event)
    }

    /// Dispatch an event and remember it
    pub fn emit(&mut self, event: AlarmEvent) {
        self.notifications.notify_all(&event);

        if self.history_size == 0 {
            return;
        }
        if self.history.len() >= self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// Recent events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AlarmEvent> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for AlarmReporter {
    fn default() -> Self {
        Self::new(NotificationManager::default(), DEFAULT_HISTORY_SIZE)
    }
}
