//! Run command implementation
//!
//! Starts the monitor loop against the real board.

use crate::config::Config;
use crate::error::Result;
use crate::services::Monitor;

/// Execute the run command
pub fn run_monitor(config: &Config) -> Result<()> {
    let (sensors, board) = super::hardware(config);
    let mut monitor = Monitor::from_config(config, sensors, board)?;

    log::info!("Starting power monitor");
    log::info!("  Devices: {}", monitor.registry().len());
    log::info!("  Interval: {:?}", config.general.interval());
    log::info!("  Read timeout: {:?}", config.general.read_timeout());
    log::info!("  Single use: {}", config.general.single_use);
    log::info!("  Dry run: {}", config.general.dry_run);
    log::info!("  Syslog: {}", config.general.syslog);
    if let Some(path) = &config.general.state_file {
        log::info!("  State file: {}", path.display());
    }

    monitor.run()
}
