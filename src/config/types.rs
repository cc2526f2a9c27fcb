//! Configuration structs and defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERIAL_NUMBER: &str = "2VH7TM9L";
pub const DEFAULT_MODEL: &str = "WDC WD181KFGX-68AFPN0";

#[cfg(target_os = "windows")]
pub const DEFAULT_REMOVAL_TOOL: &str = "RemoveDrive.exe";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_REMOVAL_TOOL: &str = "removedrive";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub drive: DriveSettings,
    pub commands: CommandSettings,
    pub timing: TimingSettings,
    pub ui: UiSettings,
    pub advanced: AdvancedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    pub serial_number: String,
    pub model: String,
    /// Take the disk offline in the OS during monitor-initiated sleeps.
    pub offline_on_sleep: bool,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            serial_number: DEFAULT_SERIAL_NUMBER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            offline_on_sleep: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub removal_tool: String,
    pub command_timeout_seconds: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            removal_tool: DEFAULT_REMOVAL_TOOL.to_string(),
            command_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub periodic_check_minutes: u64,
    pub post_operation_check_seconds: u64,
    pub spin_up_seconds: u64,
    pub detection_delay_seconds: u64,
    pub detection_retries: u32,
    pub detection_interval_seconds: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            periodic_check_minutes: 10,
            post_operation_check_seconds: 3,
            spin_up_seconds: 3,
            detection_delay_seconds: 3,
            detection_retries: 4,
            detection_interval_seconds: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub show_notifications: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self { show_notifications: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub debug_mode: bool,
    pub log_level: String,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self { debug_mode: false, log_level: "INFO".to_string() }
    }
}

impl AppConfig {
    /// Clamp values that would make the monitor spin.
    pub fn normalize(mut self) -> Self {
        self.timing.periodic_check_minutes = self.timing.periodic_check_minutes.max(1);
        self.timing.post_operation_check_seconds = self.timing.post_operation_check_seconds.max(1);
        self.commands.command_timeout_seconds = self.commands.command_timeout_seconds.max(1);
        self
    }

    /// Log filter implied by the advanced section.
    pub fn log_filter(&self) -> &str {
        if self.advanced.debug_mode {
            "DEBUG"
        } else {
            &self.advanced.log_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.drive.serial_number, "2VH7TM9L");
        assert_eq!(config.drive.model, "WDC WD181KFGX-68AFPN0");
        assert_eq!(config.timing.periodic_check_minutes, 10);
        assert_eq!(config.timing.post_operation_check_seconds, 3);
        assert_eq!(config.timing.detection_retries, 4);
        assert!(config.ui.show_notifications);
        assert!(!config.advanced.debug_mode);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{"drive":{"serial_number":"ABC123"},"timing":{"periodic_check_minutes":2}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.drive.serial_number, "ABC123");
        assert_eq!(config.drive.model, DEFAULT_MODEL);
        assert_eq!(config.timing.periodic_check_minutes, 2);
        assert_eq!(config.timing.post_operation_check_seconds, 3);
        assert_eq!(config.commands.removal_tool, DEFAULT_REMOVAL_TOOL);
    }

    #[test]
    fn test_normalize_enforces_minimums() {
        let mut config = AppConfig::default();
        config.timing.periodic_check_minutes = 0;
        config.timing.post_operation_check_seconds = 0;
        let config = config.normalize();
        assert_eq!(config.timing.periodic_check_minutes, 1);
        assert_eq!(config.timing.post_operation_check_seconds, 1);
    }

    #[test]
    fn test_debug_mode_overrides_log_level() {
        let mut config = AppConfig::default();
        assert_eq!(config.log_filter(), "INFO");
        config.advanced.debug_mode = true;
        assert_eq!(config.log_filter(), "DEBUG");
    }
}
