use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Re-export mount types from msd module for configuration
pub use crate::msd::MountBackend;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GadgetConfig {
    /// User-space (FUSE) mount tool binary
    pub mount_tool_path: PathBuf,
    /// Tool used to detach user-space mounts (`<tool> -u <path>`)
    pub fuse_unmount_tool: PathBuf,
    /// Kernel module providing the mass-storage gadget
    pub driver_module: String,
    /// Extra `key=value` module parameters appended after `file=`
    pub driver_params: Vec<String>,
    /// Backing file size used when `--size-gb` is not given
    pub default_size_gb: u32,
    /// Where a freshly formatted backing file is mounted for seeding
    pub scratch_mount_path: PathBuf,
    /// Top-level directories created in a new backing file
    pub seed_directories: Vec<String>,
    /// Backend for read-only mounts; read-write mounts are always direct
    pub read_only_backend: MountBackend,
}

impl Default for GadgetConfig {
    fn default() -> Self {
        Self {
            mount_tool_path: PathBuf::from("fat32"),
            fuse_unmount_tool: PathBuf::from("fusermount"),
            driver_module: "g_mass_storage".to_string(),
            driver_params: Vec::new(),
            default_size_gb: 64,
            scratch_mount_path: PathBuf::from("/mnt/mass-storage-gadget/init"),
            seed_directories: vec!["TeslaCam".to_string(), "TeslaTrackMode".to_string()],
            read_only_backend: MountBackend::Userspace,
        }
    }
}
