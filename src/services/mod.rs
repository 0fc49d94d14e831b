//! Service layer for the alarm monitor
//!
//! Services own the device registry, resolve thresholds and drive the poll
//! loop.

pub mod monitor;
pub mod registry;
pub mod resolver;
pub mod snapshot;

pub use monitor::{CycleSummary, Monitor, MonitorConfig};
pub use registry::Registry;
pub use resolver::ThresholdResolver;
pub use snapshot::{DeviceSnapshot, PsuSnapshot, RecordSnapshot, StateSnapshot};
