//! Config command implementation
//!
//! Prints the effective configuration, the built-in defaults, or the
//! search paths.

use crate::cli::args::{ConfigArgs, OutputFormat};
use crate::cli::output::{print_output, ConfigPathEntry, ConfigPaths};
use crate::config::{Config, ConfigFile};
use crate::error::Result;

/// Execute the config command
pub fn run_config(args: &ConfigArgs, config: &Config, format: OutputFormat) -> Result<()> {
    if args.paths {
        let paths = ConfigPaths {
            paths: ConfigFile::default_paths()
                .into_iter()
                .map(|path| ConfigPathEntry {
                    exists: path.exists(),
                    path,
                })
                .collect(),
        };
        print_output(&paths, format)?;
        return Ok(());
    }

    if args.defaults {
        print_output(&Config::default(), format)?;
    } else {
        print_output(config, format)?;
    }
    Ok(())
}
