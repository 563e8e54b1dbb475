//! Flag store adapters.

mod json_dir;
mod memory;

pub use json_dir::JsonDirFlagStore;
pub use memory::InMemoryFlagStore;
