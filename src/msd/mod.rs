//! MSD (Mass Storage Device) module
//!
//! Provides the backing file side of the mass-storage gadget:
//! - Mount manager: host-side mounts of the image (direct or user-space)
//! - Backing file provisioner: one-time allocation, FAT32 format and seeding
//!
//! Architecture:
//! ```text
//! GadgetController --> BackingFileProvisioner --> MountManager
//!                              |                      |
//!                              └──── CommandExecutor ─┘
//! ```

pub mod backing;
pub mod mount;
pub mod types;

pub use backing::BackingFileProvisioner;
pub use mount::MountManager;
pub use types::{AccessMode, MountBackend, Provisioned};
