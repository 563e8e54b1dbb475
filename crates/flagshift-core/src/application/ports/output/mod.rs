//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `flagshift-adapters` crate provides implementations.

use std::collections::BTreeMap;

use crate::domain::{FlagKey, FlagVariant};
use crate::error::FlagshiftResult;

/// Port for flag persistence, partitioned by environment.
///
/// Implemented by:
/// - `flagshift_adapters::InMemoryFlagStore` (testing, dry runs)
/// - `flagshift_adapters::JsonDirFlagStore` (one JSON document per environment)
///
/// ## Design Notes
///
/// - Environments are independent namespaces; an unknown environment is empty
/// - `put` inserts or replaces; `delete` of a missing key is an error
/// - `list` returns keys in sorted order, which is the order stale flags
///   are deleted in by the planner
#[cfg_attr(test, mockall::automock)]
pub trait FlagStore: Send + Sync {
    /// Fetch one flag.
    fn get(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<Option<FlagVariant>>;

    /// Insert or replace a flag.
    fn put(&self, environment: &str, key: &FlagKey, variant: FlagVariant) -> FlagshiftResult<()>;

    /// Remove a flag. Fails with `FlagNotFound` when absent.
    fn delete(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<()>;

    /// Snapshot of every flag in an environment.
    fn list(&self, environment: &str) -> FlagshiftResult<BTreeMap<FlagKey, FlagVariant>>;

    /// Environments that hold at least one flag.
    fn environments(&self) -> FlagshiftResult<Vec<String>>;
}
