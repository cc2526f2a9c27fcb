//! Error taxonomy and process exit codes.

use thiserror::Error;

use crate::hardware::relay::RelayError;

/// Process exit codes reported by the one-shot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    InvalidArguments,
    DeviceNotFound,
    OperationFailed,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::InvalidArguments => 2,
            ExitStatus::DeviceNotFound => 3,
            ExitStatus::OperationFailed => 4,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ExitStatus::Success,
            2 => ExitStatus::InvalidArguments,
            3 => ExitStatus::DeviceNotFound,
            _ => ExitStatus::OperationFailed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("relay rejected the control report")]
    CommandRejected,

    #[error("{0} requires administrator privileges")]
    PermissionRequired(&'static str),

    #[error("{0} not found in the executable directory, working directory or PATH")]
    ExternalToolMissing(String),

    #[error("{0}")]
    SequenceFailed(String),
}

impl ToggleError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ToggleError::DeviceNotFound(_) => ExitStatus::DeviceNotFound,
            ToggleError::CommandRejected
            | ToggleError::PermissionRequired(_)
            | ToggleError::ExternalToolMissing(_)
            | ToggleError::SequenceFailed(_) => ExitStatus::OperationFailed,
        }
    }
}

impl From<RelayError> for ToggleError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::DeviceNotFound => ToggleError::DeviceNotFound("USB relay".to_string()),
            RelayError::CommandRejected => ToggleError::CommandRejected,
        }
    }
}
