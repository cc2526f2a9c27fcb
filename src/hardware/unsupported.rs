//! Fallback backends for platforms without relay or disk control support.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::hardware::relay::RelayError;
use crate::hardware::types::{DiskRecord, DriveInfo};
use crate::hardware::HostControl;
use crate::system::executor::CommandRunner;

pub(crate) fn write_relay_report(_vendor_id: u16, _product_id: u16, _report: &[u8]) -> Result<(), RelayError> {
    warn!("USB relay control is not supported on {}", std::env::consts::OS);
    Err(RelayError::DeviceNotFound)
}

pub(crate) async fn query_disks(_timeout: Duration) -> Result<Vec<DiskRecord>> {
    Err(anyhow!("disk inventory is not supported on {}", std::env::consts::OS))
}

pub struct SystemHost;

impl SystemHost {
    pub fn new(_runner: Arc<dyn CommandRunner>, _timeout: Duration) -> Self {
        Self
    }
}

#[async_trait]
impl HostControl for SystemHost {
    fn is_elevated(&self) -> bool {
        false
    }

    async fn rescan_elevated(&self) -> bool {
        false
    }

    async fn rescan(&self) -> bool {
        false
    }

    async fn set_disk_online(&self, _drive: &DriveInfo) -> bool {
        false
    }

    async fn set_disk_offline(&self, _drive: &DriveInfo) -> bool {
        false
    }

    async fn volumes(&self, _drive: &DriveInfo) -> Vec<String> {
        Vec::new()
    }
}
