//! Scripted stand-ins for the relay, disk inventory, OS host control and child processes.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use hdd_toggle::daemon::presenter::{NotifyLevel, Presenter};
use hdd_toggle::hardware::types::{DriveInfo, DriveState, RelayTarget};
use hdd_toggle::hardware::{DiskInventory, HostControl, RelayDriver, RelayError};
use hdd_toggle::power::removal::SafeRemoval;
use hdd_toggle::power::sequencer::{PowerSequencer, SequenceSettings};
use hdd_toggle::system::executor::{CommandRunner, ShellCommand, WindowMode};
use hdd_toggle::system::locator::ToolLocator;

pub const SERIAL: &str = "2VH7TM9L";
pub const TOOL: &str = "RemoveDrive.exe";

pub fn drive(state: DriveState) -> DriveInfo {
    DriveInfo {
        found: true,
        serial_number: SERIAL.to_string(),
        model: "WDC WD181KFGX-68AFPN0".to_string(),
        disk_number: 2,
        state,
        device: None,
    }
}

pub struct FakeRelay {
    present: bool,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<RelayTarget>>,
}

impl FakeRelay {
    pub fn present() -> Arc<Self> {
        Arc::new(Self { present: true, gate: None, calls: Mutex::new(Vec::new()) })
    }

    pub fn absent() -> Arc<Self> {
        Arc::new(Self { present: false, gate: None, calls: Mutex::new(Vec::new()) })
    }

    /// Present relay whose calls block until the gate is notified.
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self { present: true, gate: Some(gate), calls: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<RelayTarget> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayDriver for FakeRelay {
    async fn set_relay(&self, target: RelayTarget) -> Result<(), RelayError> {
        self.calls.lock().unwrap().push(target);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.present {
            Ok(())
        } else {
            Err(RelayError::DeviceNotFound)
        }
    }
}

/// Returns scripted detections in order, then the fallback forever.
pub struct FakeInventory {
    script: Mutex<VecDeque<DriveInfo>>,
    fallback: DriveInfo,
    detections: AtomicUsize,
}

impl FakeInventory {
    pub fn new(script: Vec<DriveInfo>, fallback: DriveInfo) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            detections: AtomicUsize::new(0),
        })
    }

    pub fn always(info: DriveInfo) -> Arc<Self> {
        Self::new(Vec::new(), info)
    }

    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiskInventory for FakeInventory {
    async fn detect_drive(&self, target_serial: &str) -> DriveInfo {
        assert_eq!(target_serial, SERIAL);
        self.detections.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FakeHost {
    pub elevated: bool,
    pub rescan_elevated_ok: bool,
    pub online_ok: bool,
    pub volumes: Vec<String>,
    log: Mutex<Vec<&'static str>>,
}

impl FakeHost {
    pub fn new(elevated: bool) -> Self {
        Self {
            elevated,
            rescan_elevated_ok: true,
            online_ok: true,
            volumes: Vec::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_volumes(mut self, volumes: &[&str]) -> Self {
        self.volumes = volumes.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: &'static str) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl HostControl for FakeHost {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    async fn rescan_elevated(&self) -> bool {
        self.record("rescan_elevated");
        self.rescan_elevated_ok
    }

    async fn rescan(&self) -> bool {
        self.record("rescan");
        true
    }

    async fn set_disk_online(&self, _drive: &DriveInfo) -> bool {
        self.record("online");
        self.online_ok
    }

    async fn set_disk_offline(&self, _drive: &DriveInfo) -> bool {
        self.record("offline");
        true
    }

    async fn volumes(&self, _drive: &DriveInfo) -> Vec<String> {
        self.record("volumes");
        self.volumes.clone()
    }
}

/// Child process stand-in answering every command with the same exit code.
pub struct FakeRunner {
    exit_code: i32,
    calls: Mutex<Vec<ShellCommand>>,
    windows: Mutex<Vec<WindowMode>>,
}

impl FakeRunner {
    pub fn exiting(exit_code: i32) -> Arc<Self> {
        Arc::new(Self { exit_code, calls: Mutex::new(Vec::new()), windows: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<ShellCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn windows(&self) -> Vec<WindowMode> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &ShellCommand, window: WindowMode) -> i32 {
        self.calls.lock().unwrap().push(command.clone());
        self.windows.lock().unwrap().push(window);
        self.exit_code
    }

    async fn run_captured(&self, command: &ShellCommand) -> (i32, String) {
        self.calls.lock().unwrap().push(command.clone());
        (self.exit_code, String::new())
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    states: Mutex<Vec<DriveState>>,
    notes: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    pub fn states(&self) -> Vec<DriveState> {
        self.states.lock().unwrap().clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, state: DriveState) {
        self.states.lock().unwrap().push(state);
    }

    fn notify(&self, message: &str, _level: NotifyLevel) {
        self.notes.lock().unwrap().push(message.to_string());
    }
}

/// A sequencer over fakes, with a removal tool present in a scratch directory.
pub struct Rig {
    pub relay: Arc<FakeRelay>,
    pub inventory: Arc<FakeInventory>,
    pub host: Arc<FakeHost>,
    pub runner: Arc<FakeRunner>,
    pub sequencer: Arc<PowerSequencer>,
    _tools: tempfile::TempDir,
}

impl Rig {
    pub fn new(relay: Arc<FakeRelay>, inventory: Arc<FakeInventory>, host: FakeHost, runner: Arc<FakeRunner>) -> Self {
        let tools = tempfile::tempdir().unwrap();
        std::fs::write(tools.path().join(TOOL), b"").unwrap();

        let host = Arc::new(host);
        let removal = SafeRemoval::new(runner.clone(), ToolLocator::with_dirs(vec![tools.path().to_path_buf()]), TOOL);
        let settings = SequenceSettings { target_serial: SERIAL.to_string(), ..SequenceSettings::default() };

        let sequencer = Arc::new(PowerSequencer::new(
            relay.clone(),
            inventory.clone(),
            host.clone(),
            removal,
            settings,
        ));

        Self { relay, inventory, host, runner, sequencer, _tools: tools }
    }
}
