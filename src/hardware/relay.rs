//! USB HID relay control reports and the system relay driver.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::hardware::platform;
use crate::hardware::types::RelayTarget;
use crate::hardware::RelayDriver;

pub const RELAY_VENDOR_ID: u16 = 0x16C0;
pub const RELAY_PRODUCT_ID: u16 = 0x05DF;
pub const RELAY_REPORT_SIZE: usize = 9;

/// Command bytes indexed by `[single channel][on]`.
const RELAY_COMMANDS: [[u8; 2]; 2] = [[0xFC, 0xFE], [0xFD, 0xFF]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("USB relay device not found")]
    DeviceNotFound,
    #[error("USB relay rejected the control report")]
    CommandRejected,
}

/// Build the feature report for a relay target. Byte 0 is the report id,
/// byte 1 the command and byte 2 the channel for single-channel commands.
pub fn control_report(target: RelayTarget) -> [u8; RELAY_REPORT_SIZE] {
    let channel = target.channel.number();
    let single = usize::from(channel > 0);
    let mut report = [0u8; RELAY_REPORT_SIZE];
    report[1] = RELAY_COMMANDS[single][usize::from(target.on)];
    if channel > 0 {
        report[2] = channel;
    }
    report
}

/// Relay attached over USB HID. The device is opened and released on every call.
#[derive(Debug, Clone)]
pub struct UsbRelay {
    vendor_id: u16,
    product_id: u16,
}

impl UsbRelay {
    pub fn new() -> Self {
        Self { vendor_id: RELAY_VENDOR_ID, product_id: RELAY_PRODUCT_ID }
    }
}

impl Default for UsbRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayDriver for UsbRelay {
    async fn set_relay(&self, target: RelayTarget) -> Result<(), RelayError> {
        let report = control_report(target);
        let (vendor_id, product_id) = (self.vendor_id, self.product_id);
        debug!("Sending relay report {:02X?}", report);

        let outcome = tokio::task::spawn_blocking(move || {
            platform::write_relay_report(vendor_id, product_id, &report)
        })
        .await;

        match outcome {
            Ok(Ok(())) => {
                info!("{}", target);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("{} failed: {}", target, e);
                Err(e)
            }
            Err(e) => {
                error!("Relay worker aborted: {}", e);
                Err(RelayError::CommandRejected)
            }
        }
    }
}
