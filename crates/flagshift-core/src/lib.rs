//! flagshift Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the flagshift
//! feature-flag migration engine, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          flagshift-cli (CLI)            │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │    (MigrationService, FlagService)      │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │            (Driven: FlagStore)          │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   flagshift-adapters (Infrastructure)   │
//! │  (InMemoryFlagStore, JsonDirFlagStore)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (FlagVariant, validators, planner, ...) │
//! │            No I/O, no async             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flagshift_core::prelude::*;
//!
//! # fn run(store: Box<dyn FlagStore>, file: MigrationFile) -> FlagshiftResult<()> {
//! let service = MigrationService::new(store);
//!
//! // 1. Validate and diff against the stored environment
//! let summary = service.plan(&file)?;
//!
//! // 2. Apply in order; stops at the first failing step
//! let report = service.apply(&summary)?;
//! println!("applied {} steps", report.applied.len());
//! # Ok(())
//! # }
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ApplyReport, FlagService, FlagView, MigrationService, ports::FlagStore,
    };
    pub use crate::domain::{
        Bucketing, DomainValidator, FlagKey, FlagKind, FlagVariant, MigrationFile,
        MigrationPlanner, MigrationStep, MigrationSummary, SemVer, StepMode,
        ValidatedMigrationFile, VariantComparer, VariantFormatter, VariantUpdater,
    };
    pub use crate::error::{FlagshiftError, FlagshiftResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
