//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod config;
pub mod devices;
pub mod run;
pub mod status;

pub use config::run_config;
pub use devices::run_devices;
pub use run::run_monitor;
pub use status::run_status;

use crate::cli::{Cli, Commands};
use crate::config::{Config, ConfigBuilder};
use crate::error::Result;
use crate::hw::{LmSensors, SysfsBoard};

/// Merge the config file with global flags and `run` overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut builder = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_dry_run(cli.dry_run.then_some(true));

    if let Commands::Run(args) = &cli.command {
        builder = builder
            .with_interval(args.interval)
            .with_single_use(args.once.then_some(true))
            .with_read_timeout(args.read_timeout_ms)
            .with_state_file(args.state_file.clone());
    }

    Ok(builder.build()?)
}

/// Hardware backends for a configuration
pub(crate) fn hardware(config: &Config) -> (LmSensors, SysfsBoard) {
    let timeout = config.general.read_timeout();
    let sensors = LmSensors::new(&config.paths.sensors_bin, timeout);
    let board = SysfsBoard::new(
        &config.paths.cpld_root,
        &config.paths.hwmon_root,
        &config.paths.i2cget_bin,
        timeout,
    );
    (sensors, board)
}
