//! Devices command implementation
//!
//! Lists the devices the configuration describes, without touching
//! hardware.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DeviceEntry, DeviceList};
use crate::config::Config;
use crate::error::Result;
use crate::services::Registry;

/// Execute the devices command
pub fn run_devices(config: &Config, format: OutputFormat) -> Result<()> {
    let registry = Registry::from_config(config)?;

    let list = DeviceList {
        devices: registry.devices().iter().map(DeviceEntry::from).collect(),
    };

    print_output(&list, format)?;
    Ok(())
}
