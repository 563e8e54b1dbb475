//! Schema, value and migration file validation.
//!
//! The per-variant checks return `Option<String>`: `None` when the variant
//! is consistent, otherwise a human-readable reason. They never fail hard;
//! [`DomainValidator`] turns a reason into a [`DomainError`] naming the key.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::domain::{
    entities::{
        migration::MigrationFile,
        variant::{
            AbTestFlag, BooleanFlag, EnumFlag, FlagVariant, IntegerFlag, StoredValue, StringFlag,
            TagFlag,
        },
    },
    error::DomainError,
    value_objects::{FlagKey, SemVer},
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    /// Why the variant's constraints and default are inconsistent, if they are.
    pub fn schema_violation(variant: &FlagVariant) -> Option<String> {
        match variant {
            FlagVariant::Boolean(_) => None,
            FlagVariant::Integer(f) => integer_schema(f),
            FlagVariant::String(f) => string_schema(f),
            FlagVariant::Enum(f) => enum_schema(f),
            FlagVariant::Tag(f) => tag_schema(f),
            FlagVariant::AbTest(f) => ab_test_schema(f),
        }
    }

    /// Why the variant's stored override is invalid, if it is.
    pub fn value_violation(variant: &FlagVariant) -> Option<String> {
        match variant {
            FlagVariant::Boolean(f) => boolean_value(f),
            FlagVariant::Integer(f) => stored_consistency(f)
                .or_else(|| f.value.and_then(|v| integer_candidate(f, v, "value"))),
            FlagVariant::String(f) => stored_consistency(f).or_else(|| {
                f.value
                    .as_deref()
                    .and_then(|v| string_candidate(f, v, "value"))
            }),
            FlagVariant::Enum(f) => stored_consistency(f).or_else(|| {
                f.value
                    .as_deref()
                    .and_then(|v| enum_candidate(f, v, "value"))
            }),
            FlagVariant::Tag(f) => stored_consistency(f)
                .or_else(|| f.value.as_ref().and_then(|v| tag_candidate(f, v, "value"))),
            FlagVariant::AbTest(_) => None,
        }
    }

    pub fn validate_schema(key: &str, variant: &FlagVariant) -> Result<(), DomainError> {
        match Self::schema_violation(variant) {
            Some(reason) => Err(DomainError::InvalidSchema {
                key: key.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub fn validate_value(key: &str, variant: &FlagVariant) -> Result<(), DomainError> {
        match Self::value_violation(variant) {
            Some(reason) => Err(DomainError::InvalidValue {
                key: key.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Schema first, then value.
    pub fn validate_variant(key: &str, variant: &FlagVariant) -> Result<(), DomainError> {
        Self::validate_schema(key, variant)?;
        Self::validate_value(key, variant)
    }

    pub fn validate_environment(environment: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidEnvironment {
            environment: environment.to_string(),
            reason: reason.to_string(),
        };
        if environment.trim().is_empty() {
            return Err(invalid("environment cannot be empty"));
        }
        if environment.trim() != environment {
            return Err(invalid("environment cannot have surrounding whitespace"));
        }
        if environment.contains(['/', '\\']) {
            return Err(invalid("environment cannot contain path separators"));
        }
        Ok(())
    }

    /// Validate every key and variant of an untrusted migration file.
    ///
    /// Stops at the first problem. Key errors, schema errors and value errors
    /// are reported as distinct [`DomainError`] variants.
    pub fn validate_migration_file(
        file: &MigrationFile,
    ) -> Result<ValidatedMigrationFile, DomainError> {
        Self::validate_environment(&file.environment)?;
        let version: SemVer = file.version.parse()?;

        let mut seen = HashSet::with_capacity(file.flags.len());
        let mut flags = Vec::with_capacity(file.flags.len());
        for (raw_key, variant) in file.flags.iter() {
            let key = FlagKey::parse(raw_key)?;
            if !seen.insert(raw_key) {
                return Err(DomainError::InvalidFlagKey {
                    key: raw_key.to_string(),
                    reason: "key appears more than once in the migration file".into(),
                });
            }
            Self::validate_schema(raw_key, variant)?;
            Self::validate_value(raw_key, variant)?;
            flags.push((key, variant.clone()));
        }

        debug!(
            environment = %file.environment,
            version = %version,
            flags = flags.len(),
            "Migration file validated"
        );

        Ok(ValidatedMigrationFile {
            environment: file.environment.clone(),
            version,
            created_at: file.created_at,
            flags,
        })
    }
}

/// A migration file whose environment, version, keys and variants all
/// passed validation. The planner only accepts this type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMigrationFile {
    environment: String,
    version: SemVer,
    created_at: DateTime<Utc>,
    flags: Vec<(FlagKey, FlagVariant)>,
}

impl ValidatedMigrationFile {
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn version(&self) -> SemVer {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Flags in file order.
    pub fn flags(&self) -> &[(FlagKey, FlagVariant)] {
        &self.flags
    }

    pub fn contains(&self, key: &FlagKey) -> bool {
        self.flags.iter().any(|(k, _)| k == key)
    }
}

// ── per-kind schema rules ────────────────────────────────────────────────────

fn integer_schema(f: &IntegerFlag) -> Option<String> {
    if f.min_value > f.max_value {
        return Some(format!(
            "minValue {} is greater than maxValue {}",
            f.min_value, f.max_value
        ));
    }
    integer_candidate(f, f.default_value, "defaultValue")
}

fn string_schema(f: &StringFlag) -> Option<String> {
    if let Some(pattern) = &f.reg_exp {
        if let Err(e) = Regex::new(pattern) {
            return Some(format!("regExp '{pattern}' does not compile: {e}"));
        }
    }
    string_candidate(f, &f.default_value, "defaultValue")
}

fn enum_schema(f: &EnumFlag) -> Option<String> {
    if f.enum_values.is_empty() {
        return Some("enumValues cannot be empty".into());
    }
    if let Some(dup) = first_duplicate(&f.enum_values) {
        return Some(format!("enumValues lists '{dup}' more than once"));
    }
    enum_candidate(f, &f.default_value, "defaultValue")
}

fn tag_schema(f: &TagFlag) -> Option<String> {
    if let Some(dup) = first_duplicate(&f.tag_values) {
        return Some(format!("tagValues lists '{dup}' more than once"));
    }
    if f.min_count > f.effective_max_count() {
        return Some(format!(
            "minCount {} is greater than maxCount {}",
            f.min_count,
            f.effective_max_count()
        ));
    }
    tag_candidate(f, &f.default_value, "defaultValue")
}

fn ab_test_schema(f: &AbTestFlag) -> Option<String> {
    let chance = f.chance_b_percent;
    if !chance.is_finite() || !(0.0..=100.0).contains(&chance) {
        return Some(format!("chanceBPercent {chance} is outside 0..=100"));
    }
    None
}

// ── candidate checks shared by default and value ─────────────────────────────

fn integer_candidate(f: &IntegerFlag, candidate: i64, field: &str) -> Option<String> {
    if candidate < f.min_value || candidate > f.max_value {
        return Some(format!(
            "{field} {candidate} is outside {}...{}",
            f.min_value, f.max_value
        ));
    }
    None
}

fn string_candidate(f: &StringFlag, candidate: &str, field: &str) -> Option<String> {
    let length = candidate.chars().count();
    if f.max_length > 0 && length > f.max_length {
        return Some(format!(
            "{field} is {length} characters, maxLength is {}",
            f.max_length
        ));
    }
    if let Some(pattern) = &f.reg_exp {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(candidate) => {
                return Some(format!("{field} '{candidate}' does not match /{pattern}/"));
            }
            Err(e) => return Some(format!("regExp '{pattern}' does not compile: {e}")),
            Ok(_) => {}
        }
    }
    None
}

fn enum_candidate(f: &EnumFlag, candidate: &str, field: &str) -> Option<String> {
    if candidate.is_empty() {
        return (!f.allow_empty).then(|| format!("{field} is empty but allowEmpty is false"));
    }
    if !f.enum_values.iter().any(|v| v == candidate) {
        return Some(format!(
            "{field} '{candidate}' is not one of [{}]",
            f.enum_values.join(", ")
        ));
    }
    None
}

fn tag_candidate(f: &TagFlag, candidate: &BTreeSet<String>, field: &str) -> Option<String> {
    if let Some(unknown) = candidate.iter().find(|t| !f.tag_values.contains(t)) {
        return Some(format!("{field} contains unknown tag '{unknown}'"));
    }
    let count = candidate.len();
    let max = f.effective_max_count();
    if count < f.min_count || count > max {
        return Some(format!(
            "{field} has {count} tags, expected {}...{max}",
            f.min_count
        ));
    }
    None
}

// ── override bookkeeping ─────────────────────────────────────────────────────

fn boolean_value(f: &BooleanFlag) -> Option<String> {
    stored_consistency(f)
}

fn stored_consistency<F: StoredValue>(f: &F) -> Option<String> {
    match (f.value_exists(), f.value().is_some()) {
        (true, false) => Some("valueExists is true but no value is stored".into()),
        (false, true) => Some("a value is stored but valueExists is false".into()),
        _ => None,
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .iter()
        .find(|v| !seen.insert(v.as_str()))
        .map(String::as_str)
}
