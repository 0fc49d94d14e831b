//! Trait definitions for hardware access
//!
//! These traits abstract the sensor tool and board I/O to enable testing
//! with mocks.

use crate::domain::{ChipAddress, PsuStatus};
use crate::error::HwError;

/// Source of raw sensor reports
pub trait SensorSource {
    /// Full text report for `chip`.
    ///
    /// Returns `None` when the chip cannot be read this cycle (tool missing,
    /// non-zero exit, empty output or timeout). Callers treat that as an
    /// unreachable device, not as an alarm.
    fn read(&self, chip: &str) -> Option<String>;
}

/// Board-level I/O beyond the sensor tool
pub trait BoardIo {
    /// Presence and power bits of the PSU at CPLD index `index`
    fn psu_status(&self, index: u8) -> Result<PsuStatus, HwError>;

    /// Read one byte register of the device at `address`
    fn read_register(&self, address: ChipAddress, register: u8) -> Result<u8, HwError>;

    /// Write a firmware threshold channel (e.g. `in1_min`) of the device at
    /// `address`
    fn write_threshold(&self, address: ChipAddress, channel: &str, value: i64)
        -> Result<(), HwError>;
}

impl<T: SensorSource + ?Sized> SensorSource for &T {
    fn read(&self, chip: &str) -> Option<String> {
        (**self).read(chip)
    }
}

impl<T: BoardIo + ?Sized> BoardIo for &T {
    fn psu_status(&self, index: u8) -> Result<PsuStatus, HwError> {
        (**self).psu_status(index)
    }

    fn read_register(&self, address: ChipAddress, register: u8) -> Result<u8, HwError> {
        (**self).read_register(address, register)
    }

    fn write_threshold(
        &self,
        address: ChipAddress,
        channel: &str,
        value: i64,
    ) -> Result<(), HwError> {
        (**self).write_threshold(address, channel, value)
    }
}
