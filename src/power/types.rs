//! Operation kinds, sequence phases and results.

use serde::Serialize;
use std::fmt;

use crate::error::{ExitStatus, ToggleError};
use crate::hardware::types::{DriveInfo, DriveState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Wake,
    Sleep,
}

impl OperationKind {
    pub fn start_message(self) -> &'static str {
        match self {
            OperationKind::Wake => "Waking drive...",
            OperationKind::Sleep => "Sleeping drive...",
        }
    }

    pub fn completion_message(self, succeeded: bool) -> &'static str {
        match (self, succeeded) {
            (OperationKind::Wake, true) => "Drive wake completed",
            (OperationKind::Wake, false) => "Drive wake failed",
            (OperationKind::Sleep, true) => "Drive shutdown completed",
            (OperationKind::Sleep, false) => "Drive shutdown failed",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Wake => f.write_str("wake"),
            OperationKind::Sleep => f.write_str("sleep"),
        }
    }
}

/// Where a power sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequencePhase {
    Idle,
    PoweringOn,
    PoweringOff,
    Verifying,
    Settled(DriveState),
    Failed,
}

impl fmt::Display for SequencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencePhase::Idle => f.write_str("idle"),
            SequencePhase::PoweringOn => f.write_str("powering on"),
            SequencePhase::PoweringOff => f.write_str("powering off"),
            SequencePhase::Verifying => f.write_str("verifying"),
            SequencePhase::Settled(state) => write!(f, "settled ({})", state),
            SequencePhase::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepOptions {
    /// Also mark the disk offline in the OS before cutting power.
    pub take_offline: bool,
}

/// Outcome of one Wake or Sleep sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub succeeded: bool,
    pub exit_code: i32,
    pub message: String,
    pub phase: SequencePhase,
    pub drive: Option<DriveInfo>,
}

impl OperationResult {
    pub fn settled(kind: OperationKind, state: DriveState, message: impl Into<String>, drive: Option<DriveInfo>) -> Self {
        Self {
            kind,
            succeeded: true,
            exit_code: ExitStatus::Success.code(),
            message: message.into(),
            phase: SequencePhase::Settled(state),
            drive,
        }
    }

    pub fn failed(kind: OperationKind, error: &ToggleError, drive: Option<DriveInfo>) -> Self {
        Self {
            kind,
            succeeded: false,
            exit_code: error.exit_status().code(),
            message: error.to_string(),
            phase: SequencePhase::Failed,
            drive,
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from_code(self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(OperationKind::Wake.start_message(), "Waking drive...");
        assert_eq!(OperationKind::Sleep.completion_message(true), "Drive shutdown completed");
        assert_eq!(OperationKind::Wake.completion_message(false), "Drive wake failed");
    }

    #[test]
    fn test_failed_result_carries_exit_code() {
        let result = OperationResult::failed(
            OperationKind::Wake,
            &ToggleError::DeviceNotFound("drive 2VH7TM9L".into()),
            None,
        );
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.phase, SequencePhase::Failed);
        assert_eq!(result.exit_status(), ExitStatus::DeviceNotFound);
    }
}
