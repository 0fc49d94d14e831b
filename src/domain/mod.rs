//! Domain models for powermon
//!
//! Alarm records, monitored devices and the sensor report grammar.
//! Nothing here touches hardware; values flow in as report text.

pub mod alarm;
pub mod device;
pub mod report;

pub use alarm::{AlarmRecord, Classification, Reading, Threshold, ThresholdStyle};
pub use device::{
    ChipAddress, DeviceKind, DeviceState, InputType, Monitored, MonitoredDevice, PowerSupply,
    PsuStatus, SensorChip, TemperatureProbe, VoltageRegulator,
};
