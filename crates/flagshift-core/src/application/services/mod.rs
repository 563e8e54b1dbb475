//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "plan a migration" or "set a flag value".

pub mod flag_service;
pub mod migration_service;

pub use flag_service::{FlagService, FlagView};
pub use migration_service::{ApplyReport, MigrationService};
