//! Top-level gadget actions
//!
//! Each invocation performs exactly one action and re-derives mount state from
//! the live mount table; nothing is remembered between runs.
//!
//! | Action        | Gadget driver | Mount path                          |
//! |---------------|---------------|-------------------------------------|
//! | `host-mode`   | enable        | optional, read-only                 |
//! | `client-mode` | disable       | required, read-write                |
//! | `disable`     | disable       | optional, unmounted                 |
//! | `remount`     | untouched     | required, unmount then mount        |

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::command::CommandExecutor;
use crate::config::GadgetConfig;
use crate::error::{AppError, Result};
use crate::msd::{AccessMode, BackingFileProvisioner, MountBackend, MountManager};
use crate::otg::GadgetController;

/// Action selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Expose the backing file over USB, optionally mounted read-only locally
    HostMode,
    /// Take the file back from USB and mount it read-write locally
    ClientMode,
    /// Turn the gadget off, optionally unmounting the local mount
    Disable,
    /// Re-mount the backing file locally with the chosen access mode
    Remount,
}

impl Action {
    /// Whether the action cannot run without a mount path
    pub fn requires_mount_path(self) -> bool {
        matches!(self, Action::ClientMode | Action::Remount)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::HostMode => "host-mode",
            Action::ClientMode => "client-mode",
            Action::Disable => "disable",
            Action::Remount => "remount",
        };
        write!(f, "{}", name)
    }
}

/// One action with its arguments
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: Action,
    pub backing_file: PathBuf,
    pub size_gb: u32,
    pub mount_path: Option<PathBuf>,
    /// Access mode for `remount`
    pub read_write: bool,
}

impl ActionRequest {
    /// Check arguments before anything touches the system
    pub fn validate(&self) -> Result<()> {
        if self.action.requires_mount_path() && self.mount_path.is_none() {
            return Err(AppError::Usage("mount path required.".to_string()));
        }
        Ok(())
    }

    fn required_mount_path(&self) -> Result<&Path> {
        self.mount_path
            .as_deref()
            .ok_or_else(|| AppError::Usage("mount path required.".to_string()))
    }
}

/// Runs actions against the gadget driver and mount table
pub struct GadgetService {
    gadget: GadgetController,
    mounts: MountManager,
    read_only_backend: MountBackend,
}

impl GadgetService {
    /// Wire up all components from one configuration
    pub fn new(config: &GadgetConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let mounts = MountManager::new(config, executor.clone());
        let provisioner = BackingFileProvisioner::new(config, executor.clone(), mounts.clone());
        let gadget = GadgetController::new(config, executor, provisioner);
        Self {
            gadget,
            mounts,
            read_only_backend: config.read_only_backend,
        }
    }

    /// Run a single action
    pub fn execute(&self, request: &ActionRequest) -> Result<()> {
        request.validate()?;
        info!("Running {}", request.action);

        match request.action {
            Action::HostMode => {
                self.gadget.enable(&request.backing_file, request.size_gb)?;
                if let Some(mount_path) = &request.mount_path {
                    self.mount(&request.backing_file, mount_path, AccessMode::ReadOnly)?;
                }
            }
            Action::ClientMode => {
                let mount_path = request.required_mount_path()?;
                self.gadget.disable()?;
                self.mount(&request.backing_file, mount_path, AccessMode::ReadWrite)?;
            }
            Action::Disable => {
                self.gadget.disable()?;
                if let Some(mount_path) = &request.mount_path {
                    self.mounts.unmount_any(mount_path)?;
                }
            }
            Action::Remount => {
                let mount_path = request.required_mount_path()?;
                self.mounts.unmount_any(mount_path)?;
                self.mount(
                    &request.backing_file,
                    mount_path,
                    AccessMode::from_read_write(request.read_write),
                )?;
            }
        }

        info!("{} completed", request.action);
        Ok(())
    }

    /// Backend for a caller-visible mount with the given access mode
    pub fn backend_for(&self, access: AccessMode) -> MountBackend {
        match access {
            AccessMode::ReadWrite => MountBackend::Direct,
            AccessMode::ReadOnly => self.read_only_backend,
        }
    }

    fn mount(&self, source: &Path, mount_path: &Path, access: AccessMode) -> Result<()> {
        self.mounts
            .mount(source, mount_path, access, self.backend_for(access))
    }
}
