//! Events consumed by the monitor's dispatcher, and console input feeding them.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::hardware::types::DriveInfo;
use crate::power::types::OperationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    PeriodicCheck,
    PostOperationCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Wake,
    Sleep,
    /// Sleep when the drive is online, wake otherwise.
    Toggle,
    Refresh,
    Exit,
}

/// Why a status refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    Startup,
    Manual,
    Periodic,
    PostOperation,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    OperationCompleted(OperationResult),
    StatusRefreshed { drive: DriveInfo, origin: RefreshOrigin },
    TimerFired(TimerId),
    UserAction(ActionKind),
}

pub fn parse_action(line: &str) -> Option<ActionKind> {
    match line.trim().to_ascii_lowercase().as_str() {
        "wake" | "on" | "w" => Some(ActionKind::Wake),
        "sleep" | "off" | "s" => Some(ActionKind::Sleep),
        "toggle" | "t" => Some(ActionKind::Toggle),
        "refresh" | "status" | "r" => Some(ActionKind::Refresh),
        "quit" | "exit" | "q" => Some(ActionKind::Exit),
        _ => None,
    }
}

/// Forward commands typed on stdin as user actions until stdin closes.
pub fn spawn_console_input(events: UnboundedSender<AppEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match parse_action(&line) {
                    Some(action) => {
                        if events.send(AppEvent::UserAction(action)).is_err() {
                            break;
                        }
                    }
                    None => warn!("Unknown command '{}'. Try: wake, sleep, toggle, refresh, quit", line.trim()),
                },
                Ok(None) => {
                    debug!("stdin closed, console input stopped");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    })
}
