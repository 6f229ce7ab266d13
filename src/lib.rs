//! mass-storage-gadget - USB mass-storage gadget lifecycle
//!
//! This crate drives a FAT32 backing image through its lifecycle on an
//! embedded Linux host: provisioning the image, toggling the kernel's
//! mass-storage gadget driver, and mounting the image locally either
//! read-only (while exported over USB) or read-write (while not exported).

pub mod actions;
pub mod command;
pub mod config;
pub mod error;
pub mod msd;
pub mod otg;

pub use actions::{Action, ActionRequest, GadgetService};
pub use config::GadgetConfig;
pub use error::{AppError, Result};
