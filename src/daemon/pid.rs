use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCK_FILE_NAME: &str = "hdd-toggle.pid";

const ACQUIRE_ATTEMPTS: usize = 3;

pub fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(LOCK_FILE_NAME)
}

fn read_pid(path: &Path) -> Result<Option<u32>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
    }
}

/// True when `pid` is alive and runs the same executable as this process.
/// A recycled PID belonging to some other program does not count.
fn is_running_monitor(pid: u32) -> bool {
    let pid = sysinfo::Pid::from_u32(pid);
    let mut system = sysinfo::System::new();
    if !system.refresh_process(pid) {
        return false;
    }
    let Some(process) = system.process(pid) else {
        return false;
    };
    let Ok(current) = std::env::current_exe() else {
        return true;
    };

    if let Some(exe) = process.exe() {
        return same_file(exe, &current);
    }

    // No exe path visible (other user's process): compare names, which the
    // kernel may have truncated.
    let name = process.name();
    let own = current.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    !name.is_empty() && own.starts_with(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Publish our PID at `path` in one step: the file never exists without its contents.
fn publish_pid(path: &Path, pid: u32) -> std::io::Result<()> {
    let staging = path.with_extension(format!("{}.tmp", pid));
    fs::write(&staging, pid.to_string())?;
    let linked = fs::hard_link(&staging, path);
    let _ = fs::remove_file(&staging);
    linked
}

/// Marks this process as the running monitor. Removes its PID file on drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    pid: u32,
}

impl InstanceLock {
    /// Take the lock, or return `None` when another running monitor holds it.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let path = path.into();
        let pid = std::process::id();

        for _ in 0..ACQUIRE_ATTEMPTS {
            match publish_pid(&path, pid) {
                Ok(()) => return Ok(Some(Self { path, pid })),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e).with_context(|| format!("Failed to write {:?}", path)),
            }

            let holder = read_pid(&path)?;
            if let Some(holder) = holder {
                if is_running_monitor(holder) {
                    debug!("Monitor already running as PID {}", holder);
                    return Ok(None);
                }
            }

            // Only remove the file we judged stale; a racing monitor may have replaced it.
            if read_pid(&path)? == holder {
                warn!("Removing stale lock file {:?} (PID {:?})", path, holder);
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e).with_context(|| format!("Failed to remove {:?}", path)),
                }
            }
        }

        warn!("Could not claim lock file {:?} after {} attempts", path, ACQUIRE_ATTEMPTS);
        Ok(None)
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Ok(Some(pid)) = read_pid(&self.path) {
            if pid == self.pid {
                if let Err(e) = fs::remove_file(&self.path) {
                    eprintln!("Warning: Could not remove lock file: {}", e);
                }
            }
        }
    }
}
