//! Child process executor used for OS rescans, disk state changes and the removal tool.
//! Failures never propagate: a child that cannot start or times out reports exit code 1.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Exit code reported when the child could not be started, was killed or timed out.
pub const GENERIC_FAILURE_EXIT_CODE: i32 = 1;
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Hidden,
    Visible,
}

/// A program plus its arguments, with the deadline it is allowed to run for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), timeout: DEFAULT_COMMAND_TIMEOUT }
    }

    /// Run a full command line through the platform shell.
    pub fn shell(line: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").args(["/C".to_string(), line.into()])
        } else {
            Self::new("sh").args(["-c".to_string(), line.into()])
        }
    }

    /// Run a PowerShell script without loading profiles.
    pub fn powershell(script: impl Into<String>) -> Self {
        Self::new("powershell.exe").args([
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-ExecutionPolicy".to_string(),
            "Bypass".to_string(),
            "-Command".to_string(),
            script.into(),
        ])
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build(&self, window: WindowMode) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);

        #[cfg(windows)]
        if window == WindowMode::Hidden {
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        match window {
            WindowMode::Hidden => {
                cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
            }
            WindowMode::Visible => {
                cmd.stdin(Stdio::null()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }
        cmd
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Run a command to completion and return its exit code.
pub async fn run(command: &ShellCommand, window: WindowMode) -> i32 {
    debug!("Executing: {}", command);

    let mut child = match command.build(window).spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to start '{}': {}", command.program, e);
            return GENERIC_FAILURE_EXIT_CODE;
        }
    };

    match tokio::time::timeout(command.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let code = status.code().unwrap_or(GENERIC_FAILURE_EXIT_CODE);
            trace!("'{}' exited with {}", command.program, code);
            code
        }
        Ok(Err(e)) => {
            warn!("Failed to wait for '{}': {}", command.program, e);
            GENERIC_FAILURE_EXIT_CODE
        }
        Err(_) => {
            warn!("'{}' timed out after {:?}, killing it", command.program, command.timeout);
            let _ = child.kill().await;
            GENERIC_FAILURE_EXIT_CODE
        }
    }
}

/// Run a hidden command and capture its standard output as text.
pub async fn run_captured(command: &ShellCommand) -> (i32, String) {
    debug!("Executing (captured): {}", command);

    let mut cmd = command.build(WindowMode::Hidden);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to start '{}': {}", command.program, e);
            return (GENERIC_FAILURE_EXIT_CODE, String::new());
        }
    };

    // Dropping the output future on timeout kills the child.
    match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let code = output.status.code().unwrap_or(GENERIC_FAILURE_EXIT_CODE);
            if !output.stderr.is_empty() {
                trace!("'{}' stderr: {}", command.program, String::from_utf8_lossy(&output.stderr).trim());
            }
            (code, String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(Err(e)) => {
            warn!("Failed to collect output of '{}': {}", command.program, e);
            (GENERIC_FAILURE_EXIT_CODE, String::new())
        }
        Err(_) => {
            warn!("'{}' timed out after {:?}", command.program, command.timeout);
            (GENERIC_FAILURE_EXIT_CODE, String::new())
        }
    }
}

/// Seam over process execution so sequences can run against scripted children.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ShellCommand, window: WindowMode) -> i32;

    async fn run_captured(&self, command: &ShellCommand) -> (i32, String);
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ShellCommand, window: WindowMode) -> i32 {
        run(command, window).await
    }

    async fn run_captured(&self, command: &ShellCommand) -> (i32, String) {
        run_captured(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_and_display() {
        let cmd = ShellCommand::new("RemoveDrive.exe").args(["E:", "-b"]).timeout(Duration::from_secs(5));
        assert_eq!(cmd.args, vec!["E:".to_string(), "-b".to_string()]);
        assert_eq!(cmd.timeout, Duration::from_secs(5));
        assert_eq!(cmd.to_string(), "RemoveDrive.exe E: -b");

        let shell = ShellCommand::shell("echo rescan | diskpart");
        assert_eq!(shell.args.len(), 2);
        assert_eq!(shell.args[1], "echo rescan | diskpart");
    }

    #[tokio::test]
    async fn test_missing_program_reports_generic_failure() {
        let cmd = ShellCommand::new("hdd-toggle-definitely-not-a-real-program");
        assert_eq!(run(&cmd, WindowMode::Hidden).await, GENERIC_FAILURE_EXIT_CODE);
        let (code, output) = run_captured(&cmd).await;
        assert_eq!(code, GENERIC_FAILURE_EXIT_CODE);
        assert!(output.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_and_output_are_reported() {
        let failing = ShellCommand::shell("exit 7");
        assert_eq!(run(&failing, WindowMode::Hidden).await, 7);

        let (code, output) = run_captured(&ShellCommand::shell("echo hello")).await;
        assert_eq!(code, 0);
        assert_eq!(output.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_reports_generic_failure() {
        let slow = ShellCommand::shell("sleep 5").timeout(Duration::from_millis(100));
        assert_eq!(run(&slow, WindowMode::Hidden).await, GENERIC_FAILURE_EXIT_CODE);
    }
}
