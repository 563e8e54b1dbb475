pub mod migration;
pub mod variant;

pub use migration::{FlagEntries, MigrationFile, MigrationStep, MigrationSummary, StepMode};
pub use variant::{
    AbTestFlag, BooleanFlag, EnumFlag, FlagVariant, IntegerFlag, StoredValue, StringFlag, TagFlag,
};
