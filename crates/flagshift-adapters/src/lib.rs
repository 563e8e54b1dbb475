//! Infrastructure adapters for flagshift.
//!
//! This crate implements the ports defined in `flagshift-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod flag_store;
pub mod migration_file;

// Re-export commonly used adapters
pub use flag_store::{InMemoryFlagStore, JsonDirFlagStore};
pub use migration_file::{load_migration_file, parse_migration_file, to_pretty_json, write_json};
