//! Gadget configuration
//!
//! A single [`GadgetConfig`] is built at startup (defaults, then an optional
//! TOML file, then CLI overrides) and passed to every component constructor.

mod schema;
mod store;

pub use schema::GadgetConfig;
pub use store::{load, parse, validate};
