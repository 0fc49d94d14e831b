//! Read-only snapshots for the query interface
//!
//! Snapshots copy the monitor state into plain serializable structs so the
//! `status` command and the state file can inspect it without borrowing
//! the registry.

use crate::alerts::{names, AlarmEvent};
use crate::domain::{
    AlarmRecord, Classification, DeviceKind, DeviceState, InputType, Monitored, MonitoredDevice,
    PsuStatus, Reading, Threshold,
};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One alarm record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub name: String,
    pub display_name: String,
    pub value: Reading,
    pub min: Threshold,
    pub max: Threshold,
    pub max_hyst: Threshold,
    pub classification: Option<Classification>,
    pub failing: bool,
}

impl RecordSnapshot {
    fn new(record: &AlarmRecord, display_name: String) -> Self {
        Self {
            name: record.name().to_string(),
            display_name,
            value: record.reading(),
            min: record.min(),
            max: record.max(),
            max_hyst: record.max_hyst(),
            classification: record.last_classification(),
            failing: record.is_failing(),
        }
    }
}

/// PSU-only state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsuSnapshot {
    pub cpld_index: u8,
    pub status: PsuStatus,
    pub input_type: Option<InputType>,
}

/// One monitored device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub kind: DeviceKind,
    pub chip: String,
    pub label: String,
    pub state: DeviceState,
    pub pollable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psu: Option<PsuSnapshot>,
    pub records: Vec<RecordSnapshot>,
}

impl DeviceSnapshot {
    pub fn from_device(device: &MonitoredDevice) -> Self {
        let chip = device.chip();
        let records = chip
            .records()
            .iter()
            .map(|record| RecordSnapshot::new(record, names::display_name(device, record.name())))
            .collect();

        Self {
            kind: device.kind(),
            chip: chip.name().to_string(),
            label: names::device_label(device),
            state: chip.state(),
            pollable: device.is_pollable(),
            psu: device.as_power_supply().map(|psu| PsuSnapshot {
                cpld_index: psu.cpld_index(),
                status: psu.status(),
                input_type: psu.input_type(),
            }),
            records,
        }
    }

    /// Records with an open alarm
    pub fn failing(&self) -> impl Iterator<Item = &RecordSnapshot> {
        self.records.iter().filter(|r| r.failing)
    }
}

/// Whole monitor state, as written to the state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Completed poll cycles
    pub cycle: u64,
    pub timestamp: SystemTime,
    pub devices: Vec<DeviceSnapshot>,
    /// Recent events, oldest first
    pub events: Vec<AlarmEvent>,
}

impl StateSnapshot {
    /// Number of records with an open alarm
    pub fn failing_count(&self) -> usize {
        self.devices.iter().map(|d| d.failing().count()).sum()
    }
}
