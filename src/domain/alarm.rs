//! Alarm record domain types
//!
//! An [`AlarmRecord`] holds the last reading of one measured quantity, its
//! alarm bounds and whether a failure is currently reported for it.

use super::report::{self, Bound, ValueToken};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last reading of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    /// Nothing read yet
    #[default]
    Unread,
    /// The sensor reported `N/A` or an unparsable token
    Invalid,
    /// Measured value in the report's base unit
    Value(f64),
}

impl Reading {
    /// Numeric value, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unread => write!(f, "unread"),
            Self::Invalid => write!(f, "N/A"),
            Self::Value(v) => write!(f, "{}", v),
        }
    }
}

/// One alarm bound
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Not resolved yet
    #[default]
    Unresolved,
    /// No bound enforced
    Disabled,
    /// Active bound (inclusive)
    Value(f64),
}

impl Threshold {
    /// Bound value when active
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    fn from_bound(bound: Option<&Bound>) -> Self {
        bound.map_or(Self::Unresolved, |b| Self::Value(b.value))
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Disabled => write!(f, "disabled"),
            Self::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Outcome of checking a reading against its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Within bounds
    Valid,
    /// At or below the lower bound
    BelowMin,
    /// At or above the upper bound (or hysteresis bound)
    AboveMax,
    /// Reading or bounds not resolved; a diagnostic, not an alarm
    Error,
}

impl Classification {
    /// Whether this is a threshold violation
    pub fn is_alarm(&self) -> bool {
        matches!(self, Self::BelowMin | Self::AboveMax)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "OK"),
            Self::BelowMin => write!(f, "BELOW_MIN"),
            Self::AboveMax => write!(f, "ABOVE_MAX"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// How a record derives its bounds from a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStyle {
    /// Min/max pair (voltage, current)
    Bounds,
    /// Upper bound only, possibly in kilo units
    Power,
    /// Upper bound plus hysteresis bound
    Temperature,
}

/// Value, bounds and fail state of one measured quantity
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmRecord {
    name: String,
    style: ThresholdStyle,
    reading: Reading,
    min: Threshold,
    max: Threshold,
    max_hyst: Threshold,
    fail: bool,
    last: Option<Classification>,
}

impl AlarmRecord {
    /// Create a record for `name` resolving its bounds with `style`
    pub fn new(name: impl Into<String>, style: ThresholdStyle) -> Self {
        let max_hyst = match style {
            ThresholdStyle::Temperature => Threshold::Unresolved,
            _ => Threshold::Disabled,
        };

        Self {
            name: name.into(),
            style,
            reading: Reading::Unread,
            min: Threshold::Unresolved,
            max: Threshold::Unresolved,
            max_hyst,
            fail: false,
            last: None,
        }
    }

    /// Measurement label as printed by the sensor tool
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> ThresholdStyle {
        self.style
    }

    pub fn reading(&self) -> Reading {
        self.reading
    }

    pub fn min(&self) -> Threshold {
        self.min
    }

    pub fn max(&self) -> Threshold {
        self.max
    }

    pub fn max_hyst(&self) -> Threshold {
        self.max_hyst
    }

    /// Whether a failure is currently reported for this record
    pub fn is_failing(&self) -> bool {
        self.fail
    }

    /// Classification produced by the last poll
    pub fn last_classification(&self) -> Option<Classification> {
        self.last
    }

    /// Set direct bounds
    pub fn set_threshold(&mut self, min: Threshold, max: Threshold) {
        self.min = min;
        self.max = max;
    }

    /// Set temperature bounds; the lower bound is disabled
    pub fn set_temp_threshold(&mut self, max: Threshold, max_hyst: Threshold) {
        self.min = Threshold::Disabled;
        self.max = max;
        self.max_hyst = max_hyst;
    }

    /// Resolve bounds from a report line according to the record's style
    pub fn resolve_from_line(&mut self, line: &str) {
        match self.style {
            ThresholdStyle::Bounds => self.set_threshold_from_line(line),
            ThresholdStyle::Power => self.set_power_threshold(line),
            ThresholdStyle::Temperature => self.set_temp_threshold_from_line(line),
        }
    }

    /// Min/max from the advertised limits of a line.
    ///
    /// Two limits are taken positionally. A single limit is a lower bound when
    /// its key says so and an upper bound otherwise.
    pub fn set_threshold_from_line(&mut self, line: &str) {
        let bounds = report::bounds(line);
        let (min, max) = match bounds.as_slice() {
            [] => (Threshold::Unresolved, Threshold::Unresolved),
            [only] if only.is_lower() => (Threshold::Value(only.value), Threshold::Disabled),
            [only] => (Threshold::Disabled, Threshold::Value(only.value)),
            [first, second, ..] => (Threshold::Value(first.value), Threshold::Value(second.value)),
        };
        self.set_threshold(min, max);
    }

    /// Max and hysteresis from the advertised limits of a line
    pub fn set_temp_threshold_from_line(&mut self, line: &str) {
        let bounds = report::bounds(line);
        self.set_temp_threshold(
            Threshold::from_bound(bounds.first()),
            Threshold::from_bound(bounds.get(1)),
        );
    }

    /// Upper bound of a power quantity, normalized from kilo units.
    ///
    /// The lower bound stays disabled so an idle supply drawing 0 W is not
    /// reported.
    pub fn set_power_threshold(&mut self, line: &str) {
        let bounds = report::bounds(line);
        self.min = Threshold::Disabled;
        self.max_hyst = Threshold::Disabled;
        self.max = Threshold::from_bound(bounds.first());
    }

    /// Store the value of a report line (`Invalid` when unavailable)
    pub fn update_value(&mut self, line: &str) {
        self.reading = match report::value_token(line) {
            ValueToken::Number(v) => Reading::Value(v),
            ValueToken::NotAvailable | ValueToken::Malformed => Reading::Invalid,
        };
    }

    /// Store a numeric value directly
    pub fn set_value(&mut self, value: f64) {
        self.reading = Reading::Value(value);
    }

    /// Check the current reading against the bounds.
    ///
    /// Pure: calling it repeatedly yields the same result and never changes
    /// the fail flag.
    pub fn classify(&self) -> Classification {
        let Reading::Value(value) = self.reading else {
            return Classification::Error;
        };
        if self.min == Threshold::Unresolved || self.max == Threshold::Unresolved {
            return Classification::Error;
        }

        let at_or_above = |bound: Threshold| bound.value().is_some_and(|b| value >= b);
        let at_or_below = |bound: Threshold| bound.value().is_some_and(|b| value <= b);

        if self.min == Threshold::Disabled {
            if at_or_above(self.max) || at_or_above(self.max_hyst) {
                return Classification::AboveMax;
            }
            return Classification::Valid;
        }

        if self.max == Threshold::Disabled {
            if at_or_below(self.min) {
                return Classification::BelowMin;
            }
            return Classification::Valid;
        }

        if at_or_below(self.min) {
            Classification::BelowMin
        } else if at_or_above(self.max) {
            Classification::AboveMax
        } else {
            Classification::Valid
        }
    }

    /// Record the classification of the current poll
    pub(crate) fn set_last(&mut self, classification: Classification) {
        self.last = Some(classification);
    }

    pub(crate) fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }
}
