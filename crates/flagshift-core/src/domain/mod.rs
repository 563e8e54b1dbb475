//! Core domain layer for flagshift.
//!
//! Pure business logic: the flag variant model, its validators, comparer,
//! updater and formatter, and the migration planner. Storage and
//! presentation are reached through ports defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable entities**: Updates return new variants
//! - **Exhaustive kinds**: Every component matches all six variant kinds

pub mod compare;
pub mod entities;
pub mod error;
pub mod format;
pub mod planner;
pub mod update;
pub mod validation;
pub mod value_objects;

pub use compare::VariantComparer;
pub use entities::{
    AbTestFlag, BooleanFlag, EnumFlag, FlagEntries, FlagVariant, IntegerFlag, MigrationFile,
    MigrationStep, MigrationSummary, StepMode, StoredValue, StringFlag, TagFlag,
};
pub use error::{DomainError, ErrorCategory};
pub use format::{Bucketing, EffectiveValue, VariantDisplay, VariantFormatter};
pub use planner::{MigrationPlanner, PlanBuilder};
pub use update::VariantUpdater;
pub use validation::{DomainValidator, ValidatedMigrationFile};
pub use value_objects::{FlagKey, FlagKind, SemVer};
