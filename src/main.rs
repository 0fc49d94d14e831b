//! powermon - BMC hardware alarm monitor
//!
//! Polls board power and temperature sensors and logs threshold violations
//! and recoveries.

use clap::Parser;
use powermon::cli::args::{generate_completions, Cli, Commands};
use powermon::commands::{load_config, run_config, run_devices, run_monitor, run_status};
use powermon::error::{AppError, ConfigError, HwError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let config = load_config(cli)?;

    match &cli.command {
        Commands::Run(_) => run_monitor(&config),

        Commands::Status(args) => run_status(args, &config, cli.format),

        Commands::Devices => run_devices(&config, cli.format),

        Commands::Config(args) => run_config(args, &config, cli.format),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'powermon config --paths' to see where config is searched.");
        }
        AppError::Config(ConfigError::InvalidValue { .. }) => {
            eprintln!();
            eprintln!("Hint: Run 'powermon config --defaults' for a valid example.");
        }
        AppError::Hardware(HwError::Spawn { .. }) => {
            eprintln!();
            eprintln!("Hint: Make sure lm-sensors and i2c-tools are installed.");
            eprintln!("      Paths can be set in the [paths] config section.");
        }
        AppError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!();
            eprintln!("Hint: Try running as root.");
        }
        AppError::NoDevices => {
            eprintln!();
            eprintln!("Hint: Add [[psu]], [[regulator]] or [[temperature]] entries.");
        }
        _ => {}
    }
}
