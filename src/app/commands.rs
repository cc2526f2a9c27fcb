//! One-shot command handlers and the monitor launcher.

use anyhow::Result;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::persistence::save_config;
use crate::config::types::AppConfig;
use crate::daemon::controller::Controller;
use crate::daemon::events::{spawn_console_input, ActionKind, AppEvent};
use crate::daemon::pid::InstanceLock;
use crate::daemon::presenter::ConsolePresenter;
use crate::error::{ExitStatus, ToggleError};
use crate::hardware::types::{DriveInfo, DriveState, RelayTarget};
use crate::hardware::{DiskInventory, RelayDriver, SystemDiskInventory, SystemHost, UsbRelay};
use crate::power::removal::SafeRemoval;
use crate::power::sequencer::{PowerSequencer, SequenceSettings};
use crate::power::types::{OperationResult, SleepOptions};
use crate::system::executor::{CommandRunner, SystemRunner};
use crate::system::locator::ToolLocator;

/// Wire the sequencer to the real relay, disk inventory and OS tooling.
pub fn build_sequencer(config: &AppConfig) -> PowerSequencer {
    let timeout = Duration::from_secs(config.commands.command_timeout_seconds);
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

    let removal = SafeRemoval::new(runner.clone(), ToolLocator::system(), config.commands.removal_tool.clone())
        .with_timeout(timeout);

    PowerSequencer::new(
        Arc::new(UsbRelay::new()),
        Arc::new(SystemDiskInventory::new()),
        Arc::new(SystemHost::new(runner, timeout)),
        removal,
        SequenceSettings::from(config),
    )
}

fn report(result: &OperationResult) -> ExitStatus {
    println!();
    println!("{}", result.message);
    if let Some(drive) = &result.drive {
        println!("Drive: {} (serial {}, disk {})", drive.model, drive.serial_number, drive.disk_number);
    }
    result.exit_status()
}

pub async fn run_wake(sequencer: &PowerSequencer) -> ExitStatus {
    println!("=== HDD WAKE ===");
    report(&sequencer.run_wake().await)
}

pub async fn run_sleep(sequencer: &PowerSequencer, take_offline: bool) -> ExitStatus {
    println!("=== HDD SLEEP ===");
    report(&sequencer.run_sleep(SleepOptions { take_offline }).await)
}

pub async fn run_relay(relay: &dyn RelayDriver, target: RelayTarget) -> ExitStatus {
    match relay.set_relay(target).await {
        Ok(()) => {
            println!("{}", target);
            ExitStatus::Success
        }
        Err(e) => {
            let err = ToggleError::from(e);
            eprintln!("Error: {}", err);
            ExitStatus::OperationFailed
        }
    }
}

/// JSON shape of `status --json`.
pub fn status_json(info: &DriveInfo) -> serde_json::Value {
    if !info.found {
        return json!({ "status": "offline", "found": false });
    }
    let status = if info.state == DriveState::Online { "online" } else { "offline" };
    json!({
        "status": status,
        "found": true,
        "serial": info.serial_number,
        "model": info.model,
        "disk": info.disk_number,
    })
}

pub fn status_text(info: &DriveInfo, config: &AppConfig) -> String {
    if !info.found {
        return format!(
            "Drive: OFFLINE (not detected)\nTarget: {} (Serial: {})",
            config.drive.model, config.drive.serial_number
        );
    }
    let status = if info.state == DriveState::Online { "ONLINE" } else { "OFFLINE" };
    format!(
        "Drive: {}\nModel: {}\nSerial: {}\nDisk Number: {}",
        status, info.model, info.serial_number, info.disk_number
    )
}

pub async fn run_status(inventory: &dyn DiskInventory, config: &AppConfig, as_json: bool) -> ExitStatus {
    let info = inventory.detect_drive(&config.drive.serial_number).await;
    if as_json {
        println!("{}", status_json(&info));
    } else {
        println!("{}", status_text(&info, config));
    }
    ExitStatus::Success
}

/// Print the active configuration, or with `init` write a default config file.
pub async fn show_config(config: &AppConfig, path: &Path, init: bool) -> ExitStatus {
    let outcome = if init {
        save_config(&AppConfig::default(), path)
            .await
            .map(|()| println!("Wrote default configuration to {:?}", path))
    } else {
        serde_json::to_string_pretty(config)
            .map(|rendered| {
                println!("Configuration file: {:?}", path);
                println!("{}", rendered);
            })
            .map_err(anyhow::Error::from)
    };
    exit_status_of(outcome)
}

/// Report an internal failure on stderr and map it to the operation-failed exit code.
pub fn exit_status_of(outcome: Result<()>) -> ExitStatus {
    match outcome {
        Ok(()) => ExitStatus::Success,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitStatus::OperationFailed
        }
    }
}

/// Run the background monitor until the user quits or Ctrl+C.
pub async fn run_watch(config: &AppConfig, lock_path: &Path) -> ExitStatus {
    let _lock = match InstanceLock::acquire(lock_path) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            println!("HDD Toggle is already running.");
            return ExitStatus::Success;
        }
        Err(e) => return exit_status_of(Err(e)),
    };

    info!(
        "Monitoring drive {} ({}), checking every {} min",
        config.drive.model, config.drive.serial_number, config.timing.periodic_check_minutes
    );
    println!("Commands: wake, sleep, toggle, refresh, quit");

    let sequencer = Arc::new(build_sequencer(config));
    let presenter = Arc::new(ConsolePresenter::new(config.ui.show_notifications));
    let (controller, events) = Controller::new(sequencer, presenter, config);

    let input = spawn_console_input(controller.sender());
    let ctrl_c_events = controller.sender();
    let ctrl_c = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                let _ = ctrl_c_events.send(AppEvent::UserAction(ActionKind::Exit));
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let monitor = tokio::spawn(controller.run(events));
    if let Err(e) = monitor.await {
        error!("Monitor loop aborted: {}", e);
    }

    input.abort();
    ctrl_c.abort();
    info!("HDD Toggle monitor stopped");
    ExitStatus::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_not_found() {
        assert_eq!(
            status_json(&DriveInfo::not_found()).to_string(),
            r#"{"status":"offline","found":false}"#
        );
    }

    #[test]
    fn test_status_json_found() {
        let info = DriveInfo {
            found: true,
            serial_number: "2VH7TM9L".into(),
            model: "WDC WD181KFGX-68AFPN0".into(),
            disk_number: 2,
            state: DriveState::Online,
            device: None,
        };
        assert_eq!(
            status_json(&info).to_string(),
            r#"{"status":"online","found":true,"serial":"2VH7TM9L","model":"WDC WD181KFGX-68AFPN0","disk":2}"#
        );

        let unknown = DriveInfo { state: DriveState::Unknown, ..info };
        assert_eq!(status_json(&unknown)["status"], "offline");
    }

    #[tokio::test]
    async fn test_config_init_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdd-toggle.json");
        let mut loaded = AppConfig::default();
        loaded.drive.serial_number = "ZZZ999".into();

        assert_eq!(show_config(&loaded, &path, true).await, ExitStatus::Success);
        let written: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.drive.serial_number, AppConfig::default().drive.serial_number);
    }

    #[tokio::test]
    async fn test_config_init_unwritable_path_fails_with_code_4() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("hdd-toggle.json");

        let status = show_config(&AppConfig::default(), &path, true).await;
        assert_eq!(status, ExitStatus::OperationFailed);
        assert_eq!(status.code(), 4);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_watch_with_unusable_lock_path_fails_with_code_4() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("missing").join("hdd-toggle.pid");

        assert_eq!(run_watch(&AppConfig::default(), &lock_path).await, ExitStatus::OperationFailed);
    }

    #[test]
    fn test_status_text_mentions_target_when_missing() {
        let text = status_text(&DriveInfo::not_found(), &AppConfig::default());
        assert!(text.contains("not detected"));
        assert!(text.contains("2VH7TM9L"));
    }
}
