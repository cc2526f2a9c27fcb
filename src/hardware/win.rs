//! Windows backends: HID feature reports, CIM disk inventory and PowerShell disk control.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::ffi::c_void;
use std::mem::size_of;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use windows::core::PCWSTR;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW,
    SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO,
    SP_DEVICE_INTERFACE_DATA, SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows::Win32::Devices::HumanInterfaceDevice::{HidD_GetAttributes, HidD_GetHidGuid, HidD_SetFeature, HIDD_ATTRIBUTES};
use windows::Win32::Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, HWND};
use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
use windows::Win32::Storage::FileSystem::{CreateFileW, FILE_FLAGS_AND_ATTRIBUTES, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

use crate::hardware::relay::RelayError;
use crate::hardware::types::{DiskRecord, DriveInfo};
use crate::hardware::HostControl;
use crate::system::executor::{self, CommandRunner, ShellCommand, WindowMode};
use crate::system::parser::{parse_disk_records, parse_drive_letters};

const DISK_QUERY: &str = "Get-CimInstance -Namespace root/Microsoft/Windows/Storage -ClassName MSFT_Disk \
    | Select-Object SerialNumber,FriendlyName,Number,IsOffline | ConvertTo-Json -Compress";

const ELEVATED_RESCAN: &str = "Start-Process -FilePath cmd.exe \
    -ArgumentList '/c pnputil /scan-devices & echo rescan | diskpart' \
    -Verb RunAs -WindowStyle Hidden -Wait -ErrorAction Stop";

/// Time for Plug and Play to surface the disk after an elevated rescan.
const ELEVATED_RESCAN_SETTLE: Duration = Duration::from_secs(6);

struct DeviceInfoList(HDEVINFO);

impl Drop for DeviceInfoList {
    fn drop(&mut self) {
        unsafe {
            let _ = SetupDiDestroyDeviceInfoList(self.0);
        }
    }
}

struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Device path of the HID interface at `index`, or None when enumeration is exhausted.
unsafe fn interface_path(devices: &DeviceInfoList, guid: &windows::core::GUID, index: u32) -> Option<Option<Vec<u16>>> {
    let mut interface = SP_DEVICE_INTERFACE_DATA {
        cbSize: size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
        ..Default::default()
    };
    if SetupDiEnumDeviceInterfaces(devices.0, None, guid, index, &mut interface).is_err() {
        return None;
    }

    let mut required = 0u32;
    let _ = SetupDiGetDeviceInterfaceDetailW(devices.0, &interface, None, 0, Some(&mut required as *mut u32), None);
    if (required as usize) < size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() {
        return Some(None);
    }

    // u64 backing keeps the detail struct aligned.
    let mut buffer = vec![0u64; (required as usize).div_ceil(size_of::<u64>())];
    let detail = buffer.as_mut_ptr() as *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W;
    (*detail).cbSize = size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32;

    if SetupDiGetDeviceInterfaceDetailW(devices.0, &interface, Some(detail), required, None, None).is_err() {
        return Some(None);
    }

    let start = std::ptr::addr_of!((*detail).DevicePath) as *const u16;
    let max = (required as usize - (start as usize - detail as usize)) / size_of::<u16>();
    let mut path = Vec::with_capacity(max);
    for i in 0..max {
        let ch = *start.add(i);
        path.push(ch);
        if ch == 0 {
            break;
        }
    }
    Some(Some(path))
}

pub(crate) fn write_relay_report(vendor_id: u16, product_id: u16, report: &[u8]) -> Result<(), RelayError> {
    unsafe {
        let guid = HidD_GetHidGuid();
        let devices = SetupDiGetClassDevsW(Some(&guid as *const _), PCWSTR::null(), HWND::default(), DIGCF_PRESENT | DIGCF_DEVICEINTERFACE)
            .map_err(|e| {
                warn!("HID enumeration failed: {}", e);
                RelayError::DeviceNotFound
            })?;
        let devices = DeviceInfoList(devices);

        let mut index = 0u32;
        while let Some(path) = interface_path(&devices, &guid, index) {
            index += 1;
            let Some(path) = path else {
                continue;
            };

            let Ok(handle) = CreateFileW(
                PCWSTR(path.as_ptr()),
                (GENERIC_READ | GENERIC_WRITE).0,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                HANDLE::default(),
            ) else {
                continue;
            };
            let handle = OwnedHandle(handle);

            let mut attributes = HIDD_ATTRIBUTES {
                Size: size_of::<HIDD_ATTRIBUTES>() as u32,
                ..Default::default()
            };
            if !HidD_GetAttributes(handle.0, &mut attributes).as_bool() {
                continue;
            }
            if attributes.VendorID != vendor_id || attributes.ProductID != product_id {
                continue;
            }

            trace!("Relay found at HID interface {}", index - 1);
            let sent = HidD_SetFeature(handle.0, report.as_ptr() as *const c_void, report.len() as u32);
            return if sent.as_bool() { Ok(()) } else { Err(RelayError::CommandRejected) };
        }
    }

    debug!("No HID interface reports {:04X}:{:04X}", vendor_id, product_id);
    Err(RelayError::DeviceNotFound)
}

pub(crate) async fn query_disks(timeout: Duration) -> Result<Vec<DiskRecord>> {
    let cmd = ShellCommand::powershell(DISK_QUERY).timeout(timeout);
    let (code, output) = executor::run_captured(&cmd).await;
    if code != 0 {
        return Err(anyhow!("MSFT_Disk query exited with code {}", code));
    }
    parse_disk_records(&output)
}

fn process_is_elevated() -> bool {
    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }
        let token = OwnedHandle(token);

        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned = 0u32;
        let queried = GetTokenInformation(
            token.0,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
            size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
        .is_ok();

        queried && elevation.TokenIsElevated != 0
    }
}

/// Disk control through pnputil, diskpart and the Storage PowerShell module.
pub struct SystemHost {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl SystemHost {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn powershell(&self, script: String) -> i32 {
        let cmd = ShellCommand::powershell(script).timeout(self.timeout);
        self.runner.run(&cmd, WindowMode::Hidden).await
    }

    async fn set_offline_flag(&self, drive: &DriveInfo, offline: bool) -> bool {
        if drive.disk_number < 0 {
            warn!("Disk number unknown for {}", drive.serial_number);
            return false;
        }
        let flag = if offline { "$true" } else { "$false" };
        let script = format!("Set-Disk -Number {} -IsOffline {} -ErrorAction Stop", drive.disk_number, flag);
        self.powershell(script).await == 0
    }
}

#[async_trait]
impl HostControl for SystemHost {
    fn is_elevated(&self) -> bool {
        process_is_elevated()
    }

    async fn rescan_elevated(&self) -> bool {
        if self.powershell(ELEVATED_RESCAN.to_string()).await != 0 {
            return false;
        }
        tokio::time::sleep(ELEVATED_RESCAN_SETTLE).await;
        true
    }

    async fn rescan(&self) -> bool {
        let pnp = ShellCommand::new("pnputil").arg("/scan-devices").timeout(self.timeout);
        let diskpart = ShellCommand::shell("echo rescan | diskpart").timeout(self.timeout);

        let pnp_ok = self.runner.run(&pnp, WindowMode::Hidden).await == 0;
        let diskpart_ok = self.runner.run(&diskpart, WindowMode::Hidden).await == 0;
        pnp_ok || diskpart_ok
    }

    async fn set_disk_online(&self, drive: &DriveInfo) -> bool {
        self.set_offline_flag(drive, false).await
    }

    async fn set_disk_offline(&self, drive: &DriveInfo) -> bool {
        self.set_offline_flag(drive, true).await
    }

    async fn volumes(&self, drive: &DriveInfo) -> Vec<String> {
        if drive.disk_number < 0 {
            return Vec::new();
        }

        let script = format!(
            "Get-Partition -DiskNumber {} -ErrorAction SilentlyContinue \
             | Where-Object {{ $_.DriveLetter -match '[A-Za-z]' }} \
             | ForEach-Object {{ $_.DriveLetter }}",
            drive.disk_number
        );
        let cmd = ShellCommand::powershell(script).timeout(self.timeout);
        let (code, output) = self.runner.run_captured(&cmd).await;
        if code != 0 {
            warn!("Partition query for disk {} exited with code {}", drive.disk_number, code);
            return Vec::new();
        }
        parse_drive_letters(&output)
    }
}
