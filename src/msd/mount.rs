//! Mount management for backing files
//!
//! Mount state is never cached: every decision re-reads the live mount table
//! through `findmnt`. A mount point is always unmounted before it is mounted
//! again, so `mount` can be called any number of times in a row.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{AccessMode, MountBackend};
use crate::command::{CommandExecutor, ShellCommand};
use crate::config::GadgetConfig;
use crate::error::Result;

/// Mounts and unmounts backing files through external tools
#[derive(Clone)]
pub struct MountManager {
    executor: Arc<dyn CommandExecutor>,
    /// FUSE mount tool (`--file <img> --mount-path <dir> mount`)
    mount_tool_path: PathBuf,
    /// FUSE unmount tool (`-u <dir>`)
    fuse_unmount_tool: PathBuf,
}

impl MountManager {
    pub fn new(config: &GadgetConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            mount_tool_path: config.mount_tool_path.clone(),
            fuse_unmount_tool: config.fuse_unmount_tool.clone(),
        }
    }

    /// Check whether `mount_path` is currently a mount point
    pub fn is_mounted(&self, mount_path: &Path) -> Result<bool> {
        let query = ShellCommand::new("findmnt").arg_path(mount_path).allow_fail();
        Ok(self.executor.run(&query)? == 0)
    }

    /// Backend holding `mount_path`, or `None` when nothing is mounted there
    ///
    /// A vfat mount was made by the kernel driver; anything else is taken to
    /// be the user-space tool.
    pub fn mounted_backend(&self, mount_path: &Path) -> Result<Option<MountBackend>> {
        if !self.is_mounted(mount_path)? {
            return Ok(None);
        }

        let query = ShellCommand::new("findmnt")
            .args(["-t", MountBackend::DIRECT_FSTYPE])
            .arg_path(mount_path)
            .allow_fail();
        let backend = if self.executor.run(&query)? == 0 {
            MountBackend::Direct
        } else {
            MountBackend::Userspace
        };
        debug!("{} is mounted via {} backend", mount_path.display(), backend);
        Ok(Some(backend))
    }

    /// Mount `source` at `mount_path`
    ///
    /// Creates the mount point if needed and unmounts whatever is already
    /// mounted there first.
    pub fn mount(
        &self,
        source: &Path,
        mount_path: &Path,
        access: AccessMode,
        backend: MountBackend,
    ) -> Result<()> {
        if !mount_path.exists() {
            debug!("Creating mount point {}", mount_path.display());
            fs::create_dir_all(mount_path)?;
        }

        if let Some(current) = self.mounted_backend(mount_path)? {
            info!(
                "{} is already mounted, unmounting before remount",
                mount_path.display()
            );
            self.detach(mount_path, current)?;
        }

        if backend == MountBackend::Userspace && access.is_read_write() {
            warn!(
                "User-space mount tool decides its own access mode; {} may not be writable",
                mount_path.display()
            );
        }

        info!(
            "Mounting {} at {} ({:?}, {} backend)",
            source.display(),
            mount_path.display(),
            access,
            backend
        );
        self.executor
            .run(&self.mount_command(source, mount_path, access, backend))?;
        Ok(())
    }

    /// Unmount `mount_path` with the given backend; no-op when not mounted
    pub fn unmount(&self, mount_path: &Path, backend: MountBackend) -> Result<()> {
        if !self.is_mounted(mount_path)? {
            debug!("{} is not mounted, nothing to unmount", mount_path.display());
            return Ok(());
        }
        self.detach(mount_path, backend)
    }

    /// Unmount `mount_path` with whichever backend currently holds it
    pub fn unmount_any(&self, mount_path: &Path) -> Result<()> {
        match self.mounted_backend(mount_path)? {
            Some(backend) => self.detach(mount_path, backend),
            None => {
                debug!("{} is not mounted, nothing to unmount", mount_path.display());
                Ok(())
            }
        }
    }

    fn detach(&self, mount_path: &Path, backend: MountBackend) -> Result<()> {
        info!("Unmounting {} ({} backend)", mount_path.display(), backend);
        self.executor.run(&self.unmount_command(mount_path, backend))?;
        Ok(())
    }

    fn mount_command(
        &self,
        source: &Path,
        mount_path: &Path,
        access: AccessMode,
        backend: MountBackend,
    ) -> ShellCommand {
        match backend {
            MountBackend::Userspace => ShellCommand::new(&self.mount_tool_path)
                .arg("--file")
                .arg_path(source)
                .arg("--mount-path")
                .arg_path(mount_path)
                .arg("mount"),
            MountBackend::Direct => ShellCommand::new("mount")
                .args(["-t", MountBackend::DIRECT_FSTYPE])
                .arg_path(source)
                .arg_path(mount_path)
                .args(["-o", access.mount_options()]),
        }
    }

    fn unmount_command(&self, mount_path: &Path, backend: MountBackend) -> ShellCommand {
        match backend {
            MountBackend::Userspace => ShellCommand::new(&self.fuse_unmount_tool)
                .arg("-u")
                .arg_path(mount_path),
            MountBackend::Direct => ShellCommand::new("umount").arg_path(mount_path),
        }
    }
}
