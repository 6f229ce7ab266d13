//! External command execution
//!
//! Every state change this tool makes goes through an external program
//! (`fallocate`, `mkfs.vfat`, `modprobe`, `findmnt`, `mount`, ...). Commands are
//! described as plain [`ShellCommand`] values and handed to a
//! [`CommandExecutor`], which spawns them, waits, and reports the exit code.
//!
//! ```text
//! GadgetService ──> GadgetController ──> BackingFileProvisioner
//!        │                 │                      │
//!        └──> MountManager ┴──────────────────────┴──> CommandExecutor
//! ```

pub mod executor;
#[cfg(test)]
pub(crate) mod testing;

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

pub use executor::{CommandExecutor, SystemExecutor};

/// An external program invocation
///
/// Arguments are kept as `OsString` so paths reach the program byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: OsString,
    args: Vec<OsString>,
    raise_on_error: bool,
}

impl ShellCommand {
    /// Create a command that fails on nonzero exit
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            raise_on_error: true,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Report the exit code instead of failing on nonzero exit.
    ///
    /// Used for queries such as `findmnt`, where a nonzero code is an answer.
    pub fn allow_fail(mut self) -> Self {
        self.raise_on_error = false;
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn raises_on_error(&self) -> bool {
        self.raise_on_error
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
