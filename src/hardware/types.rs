//! Drive, disk and relay data types shared by the hardware backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Power and visibility state of the target drive as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveState {
    Unknown,
    Online,
    Offline,
    Transitioning,
}

impl DriveState {
    pub fn label(self) -> &'static str {
        match self {
            DriveState::Online => "Drive Online",
            DriveState::Offline => "Drive Offline",
            DriveState::Transitioning => "Transitioning...",
            DriveState::Unknown => "Unknown",
        }
    }

    pub fn status_line(self) -> String {
        format!("Status: {}", self.label())
    }

    pub fn tooltip(self) -> String {
        format!("HDD Status: {}", self.label())
    }

    pub fn can_wake(self) -> bool {
        matches!(self, DriveState::Offline | DriveState::Unknown)
    }

    pub fn can_sleep(self) -> bool {
        self == DriveState::Online
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one detection pass over the OS disk list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInfo {
    pub found: bool,
    pub serial_number: String,
    pub model: String,
    /// OS disk index, -1 when unknown.
    pub disk_number: i64,
    pub state: DriveState,
    /// Kernel block device name (e.g. `sdb`) where the platform addresses disks by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl DriveInfo {
    pub fn not_found() -> Self {
        Self {
            found: false,
            serial_number: String::new(),
            model: String::new(),
            disk_number: -1,
            state: DriveState::Unknown,
            device: None,
        }
    }

    /// State used for display and action eligibility: a missing drive counts as offline.
    pub fn effective_state(&self) -> DriveState {
        if self.found {
            self.state
        } else {
            DriveState::Offline
        }
    }
}

impl Default for DriveInfo {
    fn default() -> Self {
        Self::not_found()
    }
}

/// One disk as reported by the platform storage query, before matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiskRecord {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub is_offline: Option<bool>,
    #[serde(skip)]
    pub device: Option<String>,
}

/// Relay channel addressed by a control report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayChannel {
    All,
    One,
    Two,
}

impl RelayChannel {
    /// Channel number written into the report; 0 addresses every channel.
    pub fn number(self) -> u8 {
        match self {
            RelayChannel::All => 0,
            RelayChannel::One => 1,
            RelayChannel::Two => 2,
        }
    }
}

impl FromStr for RelayChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RelayChannel::All),
            "1" => Ok(RelayChannel::One),
            "2" => Ok(RelayChannel::Two),
            other => Err(format!("invalid relay channel '{}' (expected 1, 2 or all)", other)),
        }
    }
}

impl fmt::Display for RelayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayChannel::All => f.write_str("ALL"),
            other => write!(f, "{}", other.number()),
        }
    }
}

/// Parse an `on`/`off` relay state.
pub fn parse_relay_state(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("invalid relay state '{}' (expected on or off)", other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTarget {
    pub channel: RelayChannel,
    pub on: bool,
}

impl RelayTarget {
    pub fn all(on: bool) -> Self {
        Self { channel: RelayChannel::All, on }
    }
}

impl fmt::Display for RelayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relay {}: {}", self.channel, if self.on { "ON" } else { "OFF" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_state_treats_missing_drive_as_offline() {
        let missing = DriveInfo::not_found();
        assert_eq!(missing.state, DriveState::Unknown);
        assert_eq!(missing.effective_state(), DriveState::Offline);

        let online = DriveInfo { found: true, state: DriveState::Online, ..DriveInfo::not_found() };
        assert_eq!(online.effective_state(), DriveState::Online);
    }

    #[test]
    fn test_action_eligibility() {
        assert!(DriveState::Offline.can_wake());
        assert!(DriveState::Unknown.can_wake());
        assert!(!DriveState::Online.can_wake());
        assert!(!DriveState::Transitioning.can_wake());
        assert!(DriveState::Online.can_sleep());
        assert!(!DriveState::Transitioning.can_sleep());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(DriveState::Online.tooltip(), "HDD Status: Drive Online");
        assert_eq!(DriveState::Transitioning.status_line(), "Status: Transitioning...");
        assert_eq!(RelayTarget { channel: RelayChannel::Two, on: false }.to_string(), "Relay 2: OFF");
        assert_eq!(RelayTarget::all(true).to_string(), "Relay ALL: ON");
    }

    #[test]
    fn test_parse_relay_channel_and_state() {
        assert_eq!("ALL".parse::<RelayChannel>(), Ok(RelayChannel::All));
        assert_eq!("2".parse::<RelayChannel>(), Ok(RelayChannel::Two));
        assert!("3".parse::<RelayChannel>().is_err());
        assert!("0".parse::<RelayChannel>().is_err());
        assert_eq!(parse_relay_state("On"), Ok(true));
        assert!(parse_relay_state("maybe").is_err());
    }
}
