//! Hardware seams: relay driver, disk inventory and OS host control, with per-platform backends.

use async_trait::async_trait;

pub mod inventory;
pub mod relay;
pub mod types;

#[cfg(target_os = "windows")]
mod win;
#[cfg(target_os = "windows")]
use win as platform;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod unsupported;
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
use unsupported as platform;

pub use inventory::SystemDiskInventory;
pub use platform::SystemHost;
pub use relay::{RelayError, UsbRelay};

use types::{DriveInfo, RelayTarget};

#[async_trait]
pub trait RelayDriver: Send + Sync {
    /// Send one control report; the device is opened and closed within the call.
    async fn set_relay(&self, target: RelayTarget) -> Result<(), RelayError>;
}

#[async_trait]
pub trait DiskInventory: Send + Sync {
    /// Look up the disk whose serial matches. Never fails: any query problem is reported
    /// as `found = false`.
    async fn detect_drive(&self, target_serial: &str) -> DriveInfo;
}

/// OS-side disk management used by the power sequences.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Whether the process holds administrator rights.
    fn is_elevated(&self) -> bool;

    /// Hardware rescan through an elevation prompt. Returns false if declined or failed.
    async fn rescan_elevated(&self) -> bool;

    /// Hardware rescan with the current privileges.
    async fn rescan(&self) -> bool;

    async fn set_disk_online(&self, drive: &DriveInfo) -> bool;

    async fn set_disk_offline(&self, drive: &DriveInfo) -> bool;

    /// Mounted volumes on the disk, in the form the removal tool accepts.
    async fn volumes(&self, drive: &DriveInfo) -> Vec<String>;
}
