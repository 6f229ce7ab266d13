//! Command executor trait and the process-spawning implementation

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

use super::ShellCommand;
use crate::error::{AppError, Result};

/// Runs external commands to completion
pub trait CommandExecutor {
    /// Spawn the command, wait for it, and return its exit code.
    ///
    /// Only a failure to start the program is an error here; the exit code
    /// is returned as-is whatever its value.
    fn execute(&self, command: &ShellCommand) -> Result<i32>;

    /// Execute and honour the command's raise-on-error mode.
    ///
    /// Raising commands that exit nonzero become [`AppError::CommandFailed`];
    /// commands built with `allow_fail()` get their exit code back unchanged.
    fn run(&self, command: &ShellCommand) -> Result<i32> {
        let exit_code = self.execute(command)?;
        if exit_code != 0 && command.raises_on_error() {
            return Err(AppError::CommandFailed {
                command: command.to_string(),
                exit_code,
            });
        }
        Ok(exit_code)
    }
}

/// Executor backed by `std::process::Command`
///
/// Stdio is inherited, so the tools print straight to the operator's terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, command: &ShellCommand) -> Result<i32> {
        info!("execute shell command: {}", command);

        let status = Command::new(command.program())
            .args(command.get_args())
            .status()
            .map_err(|source| AppError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let exit_code = exit_code(status);
        debug!("`{}` exited with {}", command, exit_code);
        Ok(exit_code)
    }
}

/// Map a wait status to a shell-style exit code (128 + signal when killed)
fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}
