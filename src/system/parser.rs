//! Parsers for storage query output, partition listings and sysfs HID identities.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::hardware::types::DiskRecord;

/// Decode `ConvertTo-Json` output of the MSFT_Disk query. PowerShell emits a bare
/// object for a single disk, an array for several and nothing at all for none.
pub fn parse_disk_records(json: &str) -> Result<Vec<DiskRecord>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value =
        serde_json::from_str(trimmed).context("Failed to parse disk query output")?;

    let records = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DiskRecord>, _>>()
            .context("Unexpected disk record layout")?,
        serde_json::Value::Object(_) => {
            vec![serde_json::from_value(value).context("Unexpected disk record layout")?]
        }
        _ => Vec::new(),
    };

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    serial: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
}

/// Decode `lsblk -J -d -o NAME,SERIAL,MODEL,STATE` into disk records.
pub fn parse_lsblk_disks(json: &str) -> Result<Vec<DiskRecord>> {
    let output: LsblkOutput = serde_json::from_str(json.trim()).context("Failed to parse lsblk output")?;

    Ok(output
        .blockdevices
        .into_iter()
        .map(|dev| DiskRecord {
            serial_number: dev.serial,
            friendly_name: dev.model.map(|m| m.trim().to_string()),
            number: None,
            is_offline: dev.state.map(|s| s.trim().eq_ignore_ascii_case("offline")),
            device: dev.name,
        })
        .collect())
}

/// Mounted partitions from `lsblk -J -l -o PATH,TYPE,MOUNTPOINT <disk>`.
pub fn parse_lsblk_partitions(json: &str) -> Result<Vec<String>> {
    let output: LsblkOutput = serde_json::from_str(json.trim()).context("Failed to parse lsblk output")?;

    Ok(output
        .blockdevices
        .into_iter()
        .filter(|dev| dev.kind.as_deref() == Some("part"))
        .filter(|dev| dev.mountpoint.as_deref().map_or(false, |m| !m.is_empty()))
        .filter_map(|dev| dev.path)
        .collect())
}

/// Drive letters printed one per line by `Get-Partition`, normalised to `E:` form.
/// Lines of four characters or more are not letters and are skipped.
pub fn parse_drive_letters(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.len() < 4)
        .filter_map(|line| {
            let letter = line.chars().next()?;
            letter
                .is_ascii_alphabetic()
                .then(|| format!("{}:", letter.to_ascii_uppercase()))
        })
        .collect()
}

/// Vendor and product id from a hidraw `uevent` file (`HID_ID=0003:000016C0:000005DF`).
pub fn parse_hid_id(uevent: &str) -> Option<(u16, u16)> {
    let value = uevent
        .lines()
        .find_map(|line| line.trim().strip_prefix("HID_ID="))?;

    let mut parts = value.split(':');
    let _bus = parts.next()?;
    let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
    let product = u32::from_str_radix(parts.next()?, 16).ok()?;

    Some((u16::try_from(vendor).ok()?, u16::try_from(product).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_disk_records_array_and_single() {
        let many = r#"[
            {"SerialNumber":"  2VH7TM9L  ","FriendlyName":"WDC WD181KFGX-68AFPN0","Number":2,"IsOffline":true},
            {"SerialNumber":null,"FriendlyName":"Virtual Disk","Number":0,"IsOffline":false}
        ]"#;
        let records = parse_disk_records(many).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].serial_number.as_deref(), Some("  2VH7TM9L  "));
        assert_eq!(records[0].number, Some(2));
        assert_eq!(records[0].is_offline, Some(true));
        assert_eq!(records[1].serial_number, None);

        let single = r#"{"SerialNumber":"ABC","FriendlyName":"Disk","Number":1,"IsOffline":false}"#;
        assert_eq!(parse_disk_records(single).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_disk_records_empty_and_invalid() {
        assert!(parse_disk_records("  \r\n").unwrap().is_empty());
        assert!(parse_disk_records("not json").is_err());
    }

    #[test]
    fn test_parse_lsblk_disks() {
        let json = r#"{"blockdevices":[
            {"name":"sda","serial":"S1","model":"Samsung SSD  ","state":"running"},
            {"name":"sdb","serial":"2VH7TM9L","model":"WDC WD181KFGX","state":"offline"},
            {"name":"sr0","serial":null,"model":null,"state":null}
        ]}"#;
        let records = parse_lsblk_disks(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].friendly_name.as_deref(), Some("Samsung SSD"));
        assert_eq!(records[0].is_offline, Some(false));
        assert_eq!(records[1].is_offline, Some(true));
        assert_eq!(records[1].device.as_deref(), Some("sdb"));
        assert_eq!(records[2].is_offline, None);
    }

    #[test]
    fn test_parse_lsblk_partitions() {
        let json = r#"{"blockdevices":[
            {"path":"/dev/sdb","type":"disk","mountpoint":null},
            {"path":"/dev/sdb1","type":"part","mountpoint":"/mnt/archive"},
            {"path":"/dev/sdb2","type":"part","mountpoint":null}
        ]}"#;
        assert_eq!(parse_lsblk_partitions(json).unwrap(), vec!["/dev/sdb1".to_string()]);
    }

    #[test]
    fn test_parse_drive_letters() {
        let output = "E\r\nf\r\n\r\nWARNING: something\r\n";
        assert_eq!(parse_drive_letters(output), vec!["E:".to_string(), "F:".to_string()]);
        assert!(parse_drive_letters("").is_empty());
    }

    #[test]
    fn test_parse_hid_id() {
        let uevent = "DRIVER=hid-generic\nHID_ID=0003:000016C0:000005DF\nHID_NAME=www.dcttech.com USBRelay2\n";
        assert_eq!(parse_hid_id(uevent), Some((0x16C0, 0x05DF)));
        assert_eq!(parse_hid_id("DRIVER=hid-generic\n"), None);
        assert_eq!(parse_hid_id("HID_ID=0003:zz:01"), None);
    }
}
