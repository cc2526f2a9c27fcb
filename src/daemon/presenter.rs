//! User-facing presentation of drive state and notifications.

use tracing::{debug, error, info};

use crate::hardware::types::DriveState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Error,
}

pub trait Presenter: Send + Sync {
    /// Show the current drive state (icon, tooltip, status line).
    fn render(&self, state: DriveState);

    /// Show a transient notification.
    fn notify(&self, message: &str, level: NotifyLevel);
}

/// Presenter for the console monitor: state changes and notifications go to stdout.
#[derive(Debug, Clone)]
pub struct ConsolePresenter {
    show_notifications: bool,
}

impl ConsolePresenter {
    pub fn new(show_notifications: bool) -> Self {
        Self { show_notifications }
    }
}

impl Presenter for ConsolePresenter {
    fn render(&self, state: DriveState) {
        info!("{}", state.tooltip());
        println!("{}", state.status_line());
    }

    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Info => info!("{}", message),
            NotifyLevel::Error => error!("{}", message),
        }

        if !self.show_notifications {
            debug!("Notifications disabled");
            return;
        }
        println!("🔔 {}", message);
    }
}
