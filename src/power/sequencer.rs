//! Wake and Sleep sequences: relay power, OS rescans, disk state and safe removal.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::types::AppConfig;
use crate::error::ToggleError;
use crate::hardware::types::{DriveInfo, DriveState, RelayTarget};
use crate::hardware::{DiskInventory, HostControl, RelayDriver};
use crate::power::removal::SafeRemoval;
use crate::power::types::{OperationKind, OperationResult, SequencePhase, SleepOptions};

/// Target drive and the fixed delays of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSettings {
    pub target_serial: String,
    /// Wait after relay power-on before asking the OS to rescan.
    pub spin_up_delay: Duration,
    /// Wait after the rescan before the first detection.
    pub detection_delay: Duration,
    pub detection_retries: u32,
    pub detection_interval: Duration,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SequenceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_serial: config.drive.serial_number.clone(),
            spin_up_delay: Duration::from_secs(config.timing.spin_up_seconds),
            detection_delay: Duration::from_secs(config.timing.detection_delay_seconds),
            detection_retries: config.timing.detection_retries,
            detection_interval: Duration::from_secs(config.timing.detection_interval_seconds),
        }
    }
}

pub struct PowerSequencer {
    relay: Arc<dyn RelayDriver>,
    inventory: Arc<dyn DiskInventory>,
    host: Arc<dyn HostControl>,
    removal: SafeRemoval,
    settings: SequenceSettings,
}

impl PowerSequencer {
    pub fn new(
        relay: Arc<dyn RelayDriver>,
        inventory: Arc<dyn DiskInventory>,
        host: Arc<dyn HostControl>,
        removal: SafeRemoval,
        settings: SequenceSettings,
    ) -> Self {
        Self { relay, inventory, host, removal, settings }
    }

    /// One detection pass for the configured drive.
    pub async fn detect(&self) -> DriveInfo {
        self.inventory.detect_drive(&self.settings.target_serial).await
    }

    fn enter(&self, kind: OperationKind, phase: SequencePhase) {
        debug!("{} sequence: {}", kind, phase);
    }

    fn fail(&self, kind: OperationKind, err: ToggleError, drive: Option<DriveInfo>) -> OperationResult {
        error!("❌ {}", err);
        self.enter(kind, SequencePhase::Failed);
        OperationResult::failed(kind, &err, drive)
    }

    fn settle(&self, kind: OperationKind, state: DriveState, message: String, drive: Option<DriveInfo>) -> OperationResult {
        info!("✅ {}", message);
        self.enter(kind, SequencePhase::Settled(state));
        OperationResult::settled(kind, state, message, drive)
    }

    /// Power the drive up and wait for the OS to see it.
    pub async fn run_wake(&self) -> OperationResult {
        let kind = OperationKind::Wake;
        self.enter(kind, SequencePhase::Idle);

        info!("Checking current drive status...");
        let current = self.detect().await;
        if current.found && current.state == DriveState::Online {
            let message = format!("{} ({}) is already online", current.model, current.serial_number);
            return self.settle(kind, DriveState::Online, message, Some(current));
        }

        self.enter(kind, SequencePhase::PoweringOn);
        info!("Powering on drive via USB relay...");
        if let Err(e) = self.relay.set_relay(RelayTarget::all(true)).await {
            let err = ToggleError::SequenceFailed(format!("Failed to switch relay power on: {}", e));
            return self.fail(kind, err, None);
        }

        info!("Waiting {:?} for the drive to spin up...", self.settings.spin_up_delay);
        tokio::time::sleep(self.settings.spin_up_delay).await;

        info!("Scanning for hardware changes...");
        if !self.host.rescan_elevated().await {
            warn!("Elevated rescan unavailable, falling back to basic rescan");
            if !self.host.rescan().await {
                warn!("Basic rescan reported failure");
            }
        }
        tokio::time::sleep(self.settings.detection_delay).await;

        self.enter(kind, SequencePhase::Verifying);
        let mut drive = self.detect().await;
        let mut retries = 0;
        while !drive.found && retries < self.settings.detection_retries {
            retries += 1;
            info!(
                "Drive not detected yet, retrying in {:?} ({}/{})",
                self.settings.detection_interval, retries, self.settings.detection_retries
            );
            tokio::time::sleep(self.settings.detection_interval).await;
            drive = self.detect().await;
        }

        if !drive.found {
            let err = ToggleError::DeviceNotFound(format!(
                "drive {} not detected after power-on; check connections and power supply",
                self.settings.target_serial
            ));
            return self.fail(kind, err, None);
        }

        info!("Drive detected: {} (disk {})", drive.model, drive.disk_number);

        if drive.state == DriveState::Offline {
            if !self.host.is_elevated() {
                warn!("{}", ToggleError::PermissionRequired("Bringing the disk online"));
                let message = format!("{} powered on but is offline in the OS", drive.model);
                return self.settle(kind, DriveState::Offline, message, Some(drive));
            }

            info!("Bringing disk {} online...", drive.disk_number);
            if self.host.set_disk_online(&drive).await {
                drive.state = DriveState::Online;
            } else {
                warn!("Could not bring disk {} online", drive.disk_number);
                let message = format!("{} powered on but could not be brought online", drive.model);
                return self.settle(kind, DriveState::Offline, message, Some(drive));
            }
        }

        let state = drive.state;
        let message = format!("HDD WAKE COMPLETE: {} ({}) is {}", drive.model, drive.serial_number, state);
        self.settle(kind, state, message, Some(drive))
    }

    /// Release the drive from the OS and cut its power.
    pub async fn run_sleep(&self, options: SleepOptions) -> OperationResult {
        let kind = OperationKind::Sleep;
        self.enter(kind, SequencePhase::Idle);

        info!("Locating target disk...");
        let drive = self.detect().await;

        if drive.found {
            info!("Found {} (disk {})", drive.model, drive.disk_number);

            let volumes = self.host.volumes(&drive).await;
            if volumes.is_empty() {
                info!("No mounted volumes on the drive");
            } else {
                info!("Volumes: {}", volumes.join(", "));
                if !self.removal.attempt(&volumes).await {
                    warn!("Safe removal did not succeed, continuing with power-off");
                }
            }

            if options.take_offline {
                if !self.host.is_elevated() {
                    warn!("{}", ToggleError::PermissionRequired("Taking the disk offline"));
                } else if self.host.set_disk_offline(&drive).await {
                    info!("Disk {} is offline", drive.disk_number);
                } else {
                    warn!("Could not take disk {} offline", drive.disk_number);
                }
            }
        } else {
            info!("Drive not detected by the OS, cutting power anyway");
        }

        self.enter(kind, SequencePhase::PoweringOff);
        info!("Powering off drive via USB relay...");
        let found = drive.found.then_some(drive);
        if let Err(e) = self.relay.set_relay(RelayTarget::all(false)).await {
            let err = ToggleError::SequenceFailed(format!("Failed to switch relay power off: {}", e));
            return self.fail(kind, err, found);
        }

        let message = if found.is_some() {
            "HDD SLEEP COMPLETE: drive safely powered down".to_string()
        } else {
            "HDD POWER DOWN COMPLETE: drive was not detected by the OS".to_string()
        };
        self.settle(kind, DriveState::Offline, message, found)
    }
}
