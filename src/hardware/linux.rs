//! Linux backends: hidraw relay, lsblk inventory and sysfs disk control.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::hardware::relay::RelayError;
use crate::hardware::types::{DiskRecord, DriveInfo};
use crate::hardware::HostControl;
use crate::system::executor::{self, CommandRunner, ShellCommand, WindowMode};
use crate::system::parser::{parse_hid_id, parse_lsblk_disks, parse_lsblk_partitions};

const HIDRAW_UEVENT_PATTERN: &str = "/sys/class/hidraw/hidraw*/device/uevent";
const SCSI_SCAN_PATTERN: &str = "/sys/class/scsi_host/host*/scan";
const SCSI_SCAN_ALL: &str = "- - -";

/// `HIDIOCSFEATURE(len)`: `_IOC(_IOC_READ | _IOC_WRITE, 'H', 0x06, len)`.
fn hidiocsfeature(len: usize) -> libc::c_ulong {
    (3 << 30) | ((len as libc::c_ulong) << 16) | ((b'H' as libc::c_ulong) << 8) | 0x06
}

fn find_hidraw_device(vendor_id: u16, product_id: u16) -> Option<PathBuf> {
    let entries = glob::glob(HIDRAW_UEVENT_PATTERN).ok()?;

    for uevent in entries.filter_map(Result::ok) {
        let Ok(content) = std::fs::read_to_string(&uevent) else {
            continue;
        };
        if parse_hid_id(&content) != Some((vendor_id, product_id)) {
            continue;
        }
        // /sys/class/hidraw/hidrawN/device/uevent -> /dev/hidrawN
        let node = uevent.parent()?.parent()?.file_name()?;
        return Some(PathBuf::from("/dev").join(node));
    }
    None
}

pub(crate) fn write_relay_report(vendor_id: u16, product_id: u16, report: &[u8]) -> Result<(), RelayError> {
    let Some(node) = find_hidraw_device(vendor_id, product_id) else {
        debug!("No hidraw node reports {:04X}:{:04X}", vendor_id, product_id);
        return Err(RelayError::DeviceNotFound);
    };

    let device = OpenOptions::new().read(true).write(true).open(&node).map_err(|e| {
        warn!("Cannot open relay at {:?}: {}", node, e);
        RelayError::DeviceNotFound
    })?;

    let rc = unsafe { libc::ioctl(device.as_raw_fd(), hidiocsfeature(report.len()) as _, report.as_ptr()) };
    if rc < 0 {
        warn!("HIDIOCSFEATURE on {:?} failed: {}", node, std::io::Error::last_os_error());
        return Err(RelayError::CommandRejected);
    }
    Ok(())
}

pub(crate) async fn query_disks(timeout: Duration) -> Result<Vec<DiskRecord>> {
    let cmd = ShellCommand::new("lsblk")
        .args(["-J", "-d", "-o", "NAME,SERIAL,MODEL,STATE"])
        .timeout(timeout);

    let (code, output) = executor::run_captured(&cmd).await;
    if code != 0 {
        return Err(anyhow!("lsblk exited with code {}", code));
    }
    parse_lsblk_disks(&output)
}

async fn scan_scsi_hosts() -> bool {
    let Ok(entries) = glob::glob(SCSI_SCAN_PATTERN) else {
        return false;
    };

    let mut any = false;
    for scan in entries.filter_map(Result::ok) {
        match tokio::fs::write(&scan, SCSI_SCAN_ALL).await {
            Ok(()) => {
                trace!("Rescanned {:?}", scan);
                any = true;
            }
            Err(e) => debug!("Rescan of {:?} failed: {}", scan, e),
        }
    }
    any
}

/// Disk control through sysfs and lsblk.
pub struct SystemHost {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl SystemHost {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn set_device_state(&self, drive: &DriveInfo, state: &str) -> bool {
        let Some(device) = drive.device.as_deref() else {
            warn!("No block device name for disk {}", drive.serial_number);
            return false;
        };

        let path = format!("/sys/block/{}/device/state", device);
        match tokio::fs::write(&path, state).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Writing '{}' to {} failed: {}", state, path, e);
                false
            }
        }
    }
}

#[async_trait]
impl HostControl for SystemHost {
    fn is_elevated(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    async fn rescan_elevated(&self) -> bool {
        if self.is_elevated() {
            return scan_scsi_hosts().await;
        }

        let script = format!("for h in {}; do echo '{}' > \"$h\"; done", SCSI_SCAN_PATTERN, SCSI_SCAN_ALL);
        let cmd = ShellCommand::new("pkexec").args(["sh".to_string(), "-c".to_string(), script]).timeout(self.timeout);
        self.runner.run(&cmd, WindowMode::Hidden).await == 0
    }

    async fn rescan(&self) -> bool {
        scan_scsi_hosts().await
    }

    async fn set_disk_online(&self, drive: &DriveInfo) -> bool {
        self.set_device_state(drive, "running").await
    }

    async fn set_disk_offline(&self, drive: &DriveInfo) -> bool {
        self.set_device_state(drive, "offline").await
    }

    async fn volumes(&self, drive: &DriveInfo) -> Vec<String> {
        let Some(device) = drive.device.as_deref() else {
            return Vec::new();
        };

        let cmd = ShellCommand::new("lsblk")
            .args(["-J".to_string(), "-l".to_string(), "-o".to_string(), "PATH,TYPE,MOUNTPOINT".to_string(), format!("/dev/{}", device)])
            .timeout(self.timeout);

        let (code, output) = self.runner.run_captured(&cmd).await;
        if code != 0 {
            warn!("Listing partitions of /dev/{} failed with code {}", device, code);
            return Vec::new();
        }

        parse_lsblk_partitions(&output).unwrap_or_else(|e| {
            warn!("{:#}", e);
            Vec::new()
        })
    }
}
