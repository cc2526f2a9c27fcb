//! Safe removal of the drive's volumes through the external removal tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ToggleError;
use crate::system::executor::{CommandRunner, ShellCommand, WindowMode, DEFAULT_COMMAND_TIMEOUT};
use crate::system::locator::ToolLocator;

pub const REMOVAL_ROUNDS: u32 = 3;
pub const ROUND_DELAY: Duration = Duration::from_secs(2);

pub struct SafeRemoval {
    runner: Arc<dyn CommandRunner>,
    locator: ToolLocator,
    tool_name: String,
    rounds: u32,
    round_delay: Duration,
    timeout: Duration,
}

impl SafeRemoval {
    pub fn new(runner: Arc<dyn CommandRunner>, locator: ToolLocator, tool_name: impl Into<String>) -> Self {
        Self {
            runner,
            locator,
            tool_name: tool_name.into(),
            rounds: REMOVAL_ROUNDS,
            round_delay: ROUND_DELAY,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn locate_tool(&self) -> Result<PathBuf, ToggleError> {
        self.locator
            .locate(&self.tool_name)
            .ok_or_else(|| ToggleError::ExternalToolMissing(self.tool_name.clone()))
    }

    /// Ask the removal tool to eject any of `volumes`, retrying in rounds.
    /// Succeeds as soon as one invocation exits 0.
    pub async fn attempt(&self, volumes: &[String]) -> bool {
        if volumes.is_empty() {
            debug!("No volumes to remove");
            return false;
        }

        let tool = match self.locate_tool() {
            Ok(tool) => tool,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };
        let program = tool.to_string_lossy().to_string();

        for round in 1..=self.rounds {
            for volume in volumes {
                info!("Safe removal of {} (attempt {}/{})", volume, round, self.rounds);
                let cmd = ShellCommand::new(program.clone())
                    .args([volume.as_str(), "-b"])
                    .timeout(self.timeout);

                if self.runner.run(&cmd, WindowMode::Visible).await == 0 {
                    info!("✅ Safely removed {}", volume);
                    return true;
                }
            }

            if round < self.rounds {
                tokio::time::sleep(self.round_delay).await;
            }
        }

        warn!("Safe removal failed after {} attempts", self.rounds as usize * volumes.len());
        false
    }
}
