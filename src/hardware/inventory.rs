//! Match the configured drive against the platform disk list.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::hardware::platform;
use crate::hardware::types::{DiskRecord, DriveInfo, DriveState};
use crate::hardware::DiskInventory;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Serials compare after trimming surrounding whitespace, ignoring ASCII case.
pub fn serial_matches(reported: &str, target: &str) -> bool {
    let target = target.trim();
    !target.is_empty() && reported.trim().eq_ignore_ascii_case(target)
}

/// Pick the first record whose serial matches the target.
pub fn match_disk<I>(records: I, target_serial: &str) -> DriveInfo
where
    I: IntoIterator<Item = DiskRecord>,
{
    for record in records {
        let Some(serial) = record.serial_number.as_deref() else {
            continue;
        };
        if !serial_matches(serial, target_serial) {
            continue;
        }

        let state = match record.is_offline {
            Some(true) => DriveState::Offline,
            Some(false) => DriveState::Online,
            None => DriveState::Unknown,
        };

        return DriveInfo {
            found: true,
            serial_number: serial.trim().to_string(),
            model: record.friendly_name.unwrap_or_default(),
            disk_number: record.number.unwrap_or(-1),
            state,
            device: record.device,
        };
    }

    DriveInfo::not_found()
}

/// Disk inventory backed by the platform storage query.
#[derive(Debug, Clone)]
pub struct SystemDiskInventory {
    query_timeout: Duration,
}

impl SystemDiskInventory {
    pub fn new() -> Self {
        Self { query_timeout: DEFAULT_QUERY_TIMEOUT }
    }
}

impl Default for SystemDiskInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiskInventory for SystemDiskInventory {
    async fn detect_drive(&self, target_serial: &str) -> DriveInfo {
        let records = match platform::query_disks(self.query_timeout).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Disk query failed: {:#}", e);
                return DriveInfo::not_found();
            }
        };

        debug!("Disk query returned {} disks", records.len());
        let info = match_disk(records, target_serial);
        if info.found {
            debug!(
                "Found {} (disk {}, serial {}): {}",
                info.model, info.disk_number, info.serial_number, info.state
            );
        } else {
            debug!("No disk with serial {} present", target_serial);
        }
        info
    }
}
