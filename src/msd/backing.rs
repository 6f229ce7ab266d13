//! Backing file provisioning
//!
//! A backing file is created once: allocated, formatted as FAT32, mounted at a
//! scratch point to seed the top-level directories, then unmounted. Any
//! failure along the way removes the file again, so callers either get a
//! complete image or none at all.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mount::MountManager;
use super::types::{AccessMode, MountBackend, Provisioned};
use crate::command::{CommandExecutor, ShellCommand};
use crate::config::GadgetConfig;
use crate::error::{AppError, Result};

/// Creates and seeds FAT32 backing files
#[derive(Clone)]
pub struct BackingFileProvisioner {
    executor: Arc<dyn CommandExecutor>,
    mounts: MountManager,
    /// Scratch mount point used while seeding
    scratch_mount_path: PathBuf,
    /// Top-level directories every new image gets
    seed_directories: Vec<String>,
}

impl BackingFileProvisioner {
    pub fn new(
        config: &GadgetConfig,
        executor: Arc<dyn CommandExecutor>,
        mounts: MountManager,
    ) -> Self {
        Self {
            executor,
            mounts,
            scratch_mount_path: config.scratch_mount_path.clone(),
            seed_directories: config.seed_directories.clone(),
        }
    }

    /// Make sure a provisioned backing file exists at `path`
    ///
    /// An existing file is returned as-is: its size and contents are never
    /// checked or changed.
    pub fn ensure(&self, path: &Path, size_gb: u32) -> Result<Provisioned> {
        if path.exists() {
            debug!("Backing file {} already exists", path.display());
            return Ok(Provisioned::AlreadyPresent);
        }
        if size_gb == 0 {
            return Err(AppError::Config(
                "backing file size must be greater than 0 GiB".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Creating {} GiB backing file at {}", size_gb, path.display());
        let mut rollback = Rollback::new(path);

        self.allocate(path, size_gb)?;
        self.format(path)?;

        rollback.scratch = Some((&self.mounts, self.scratch_mount_path.as_path()));
        self.mounts.mount(
            path,
            &self.scratch_mount_path,
            AccessMode::ReadWrite,
            MountBackend::Direct,
        )?;
        self.seed(&self.scratch_mount_path)?;
        self.mounts
            .unmount(&self.scratch_mount_path, MountBackend::Direct)?;

        rollback.disarm();
        info!("Backing file {} ready", path.display());
        Ok(Provisioned::Created)
    }

    fn allocate(&self, path: &Path, size_gb: u32) -> Result<()> {
        let cmd = ShellCommand::new("fallocate")
            .arg("-l")
            .arg(format!("{}GiB", size_gb))
            .arg_path(path);
        self.executor.run(&cmd)?;
        Ok(())
    }

    fn format(&self, path: &Path) -> Result<()> {
        let cmd = ShellCommand::new("mkfs.vfat")
            .args(["-F", "32", "-I"])
            .arg_path(path);
        self.executor.run(&cmd)?;
        Ok(())
    }

    fn seed(&self, root: &Path) -> Result<()> {
        for dir in &self.seed_directories {
            debug!("Creating /{} in new backing file", dir);
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(())
    }
}

/// Deletes a partially provisioned backing file when dropped armed
///
/// Once the scratch mount has been attempted, the scratch point is unmounted
/// before the file is removed.
struct Rollback<'a> {
    path: &'a Path,
    scratch: Option<(&'a MountManager, &'a Path)>,
    armed: bool,
}

impl<'a> Rollback<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            scratch: None,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(
            "Provisioning {} failed, removing partial backing file",
            self.path.display()
        );
        if let Some((mounts, scratch)) = self.scratch {
            if let Err(e) = mounts.unmount(scratch, MountBackend::Direct) {
                warn!("Failed to unmount {}: {}", scratch.display(), e);
            }
        }
        match fs::remove_file(self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
