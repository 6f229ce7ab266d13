//! MSD data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a backing file is attached to a mount point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MountBackend {
    /// Kernel vfat driver through `mount`/`umount`
    #[default]
    Direct,
    /// User-space FUSE tool; access mode is fixed by the tool
    Userspace,
}

impl MountBackend {
    /// Filesystem type the kernel reports for a direct mount
    pub const DIRECT_FSTYPE: &'static str = "vfat";
}

impl fmt::Display for MountBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountBackend::Direct => write!(f, "direct"),
            MountBackend::Userspace => write!(f, "userspace"),
        }
    }
}

/// Access mode of a mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn from_read_write(read_write: bool) -> Self {
        if read_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        }
    }

    pub fn is_read_write(self) -> bool {
        self == AccessMode::ReadWrite
    }

    /// `-o` options for a direct vfat mount
    pub fn mount_options(self) -> &'static str {
        match self {
            AccessMode::ReadWrite => "rw,noatime,nodiratime",
            AccessMode::ReadOnly => "ro",
        }
    }
}

/// Result of [`BackingFileProvisioner::ensure`](super::BackingFileProvisioner::ensure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The file already existed and was left untouched
    AlreadyPresent,
    /// A new file was allocated, formatted and seeded
    Created,
}
