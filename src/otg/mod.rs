//! OTG USB gadget management
//!
//! Only the mass-storage function is handled, through the kernel's legacy
//! `g_mass_storage` module.

pub mod gadget;

pub use gadget::GadgetController;
