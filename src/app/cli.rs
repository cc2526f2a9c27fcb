//! Command-line argument definitions (clap).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::hardware::types::{parse_relay_state, RelayTarget};

#[derive(Parser, Debug)]
#[command(name = "hdd-toggle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Power a relay-switched hard drive up and down safely", long_about = None)]
pub struct Args {
    /// Configuration file (default: hdd-toggle.json beside the executable)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the background monitor (default when no command is given)
    Watch,

    /// Power the drive on, rescan and bring it online
    Wake,

    /// Safely remove the drive's volumes and cut its power
    Sleep {
        /// Also take the disk offline in the OS (administrator only)
        #[arg(long)]
        offline: bool,
    },

    /// Switch the relay directly: `relay on`, `relay off`, `relay <1|2|all> <on|off>`
    Relay {
        /// Channel (1, 2, all), or on/off for every channel
        target: String,
        /// on or off when a channel is given
        state: Option<String>,
    },

    /// Report whether the drive is online
    Status {
        /// Print a single JSON object for scripting
        #[arg(short, long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

/// Interpret `relay` arguments: a lone state addresses every channel.
pub fn parse_relay_args(target: &str, state: Option<&str>) -> Result<RelayTarget, String> {
    match state {
        None => Ok(RelayTarget::all(parse_relay_state(target)?)),
        Some(state) => Ok(RelayTarget { channel: target.parse()?, on: parse_relay_state(state)? }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::types::RelayChannel;

    #[test]
    fn test_relay_args() {
        assert_eq!(parse_relay_args("on", None), Ok(RelayTarget::all(true)));
        assert_eq!(
            parse_relay_args("2", Some("off")),
            Ok(RelayTarget { channel: RelayChannel::Two, on: false })
        );
        assert_eq!(parse_relay_args("all", Some("ON")), Ok(RelayTarget::all(true)));
        assert!(parse_relay_args("3", Some("on")).is_err());
        assert!(parse_relay_args("0", Some("on")).is_err());
        assert!(parse_relay_args("1", None).is_err());
        assert!(parse_relay_args("1", Some("dim")).is_err());
    }

    #[test]
    fn test_subcommands_parse() {
        let args = Args::try_parse_from(["hdd-toggle", "sleep", "--offline"]).unwrap();
        assert_eq!(args.command, Some(Command::Sleep { offline: true }));

        let args = Args::try_parse_from(["hdd-toggle", "status", "-j", "--log-level", "debug"]).unwrap();
        assert_eq!(args.command, Some(Command::Status { json: true }));
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        let args = Args::try_parse_from(["hdd-toggle", "relay", "1", "on"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Relay { target: "1".into(), state: Some("on".into()) })
        );

        let args = Args::try_parse_from(["hdd-toggle"]).unwrap();
        assert_eq!(args.command, None);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = Args::try_parse_from(["hdd-toggle", "explode"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }
}
