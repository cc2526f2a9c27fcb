//! HDD Toggle entry point: CLI dispatch, logging setup, async runtime.

use clap::Parser;
use tracing::{debug, info};

use hdd_toggle::app::cli::{parse_relay_args, Args, Command};
use hdd_toggle::app::commands::{build_sequencer, exit_status_of, run_relay, run_sleep, run_status, run_wake, run_watch, show_config};
use hdd_toggle::app::logging::{init_tracing, level_filter, set_log_level};
use hdd_toggle::config::persistence::{config_path, load_config};
use hdd_toggle::daemon::pid::default_lock_path;
use hdd_toggle::hardware::{SystemDiskInventory, UsbRelay};
use hdd_toggle::ExitStatus;

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            let status = match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => ExitStatus::Success,
                _ => ExitStatus::InvalidArguments,
            };
            std::process::exit(status.code());
        }
    };

    // Priority: 1. --log-level flag, 2. HDD_TOGGLE_LOG env, 3. config file, 4. default (info)
    let explicit_level = args.log_level.clone().or_else(|| std::env::var("HDD_TOGGLE_LOG").ok());
    let filter = match explicit_level.as_deref() {
        Some(level) => level_filter(level).unwrap_or_else(|| {
            eprintln!("Invalid log level '{}'. Using INFO. Valid levels: TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL", level);
            "info"
        }),
        None => "info",
    };
    init_tracing(filter);

    let path = match config_path(args.config_file.as_deref()) {
        Ok(path) => path,
        Err(e) => std::process::exit(exit_status_of(Err(e)).code()),
    };
    let config = load_config(&path).await;

    if explicit_level.is_none() {
        if let Some(config_filter) = level_filter(config.log_filter()) {
            if config_filter != filter && set_log_level(config_filter) {
                debug!("Log level set to {} from configuration", config_filter);
            }
        }
    }

    let command = args.command.unwrap_or(Command::Watch);
    debug!("HDD Toggle v{} ({}) running {:?}", env!("CARGO_PKG_VERSION"), std::env::consts::OS, command);

    let status = match command {
        Command::Watch => {
            info!("HDD Toggle v{} starting", env!("CARGO_PKG_VERSION"));
            run_watch(&config, &default_lock_path()).await
        }
        Command::Wake => run_wake(&build_sequencer(&config)).await,
        Command::Sleep { offline } => run_sleep(&build_sequencer(&config), offline).await,
        Command::Relay { target, state } => match parse_relay_args(&target, state.as_deref()) {
            Ok(target) => run_relay(&UsbRelay::new(), target).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Usage: hdd-toggle relay <on|off> | hdd-toggle relay <1|2|all> <on|off>");
                ExitStatus::InvalidArguments
            }
        },
        Command::Status { json } => run_status(&SystemDiskInventory::new(), &config, json).await,
        Command::Config { init } => show_config(&config, &path, init).await,
    };

    std::process::exit(status.code());
}
