//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// BMC hardware alarm monitor
///
/// Polls PSUs, voltage regulators and temperature sensors through lm-sensors
/// and logs threshold violations and recoveries.
#[derive(Parser, Debug)]
#[command(name = "powermon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "POWERMON_CONFIG")]
    pub config: Option<String>,

    /// Dry run mode - log firmware threshold writes instead of performing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitor loop
    Run(RunArgs),

    /// Poll once and show every device and record
    Status(StatusArgs),

    /// List configured devices
    Devices,

    /// Show configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Poll interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run one cycle and exit (single-use mode)
    #[arg(long)]
    pub once: bool,

    /// Deadline for each sensor read in milliseconds
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Write a JSON snapshot after every cycle
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Show a snapshot written by `run --state-file` instead of polling
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Only show records with an open alarm
    #[arg(long)]
    pub failing: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print the built-in defaults instead of the effective configuration
    #[arg(long)]
    pub defaults: bool,

    /// List the configuration search paths
    #[arg(long, conflicts_with = "defaults")]
    pub paths: bool,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_devices() {
        let args = Cli::try_parse_from(["powermon", "devices"]).unwrap();
        assert!(matches!(args.command, Commands::Devices));
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let args =
            Cli::try_parse_from(["powermon", "-v", "--dry-run", "--format", "json", "devices"])
                .unwrap();
        assert!(args.verbose);
        assert!(args.dry_run);
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_cli_parse_run_args() {
        let args = Cli::try_parse_from([
            "powermon",
            "run",
            "--interval",
            "30",
            "--once",
            "--state-file",
            "/run/powermon.json",
        ])
        .unwrap();

        if let Commands::Run(run) = args.command {
            assert_eq!(run.interval, Some(30));
            assert!(run.once);
            assert_eq!(run.state_file, Some(PathBuf::from("/run/powermon.json")));
            assert_eq!(run.read_timeout_ms, None);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_status_from_state() {
        let args =
            Cli::try_parse_from(["powermon", "status", "--state", "s.json", "--failing"]).unwrap();
        if let Commands::Status(status) = args.command {
            assert_eq!(status.state, Some(PathBuf::from("s.json")));
            assert!(status.failing);
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_config_flags_conflict() {
        assert!(Cli::try_parse_from(["powermon", "config", "--defaults", "--paths"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["powermon", "fan"]).is_err());
    }
}
