//! Flag Service - single-flag operations.
//!
//! Handles reads, definitions and override changes of individual flags.
//! Separated from MigrationService for single responsibility.

use tracing::{info, instrument};

use crate::{
    application::ports::FlagStore,
    domain::{
        Bucketing, DomainError, DomainValidator as validator, FlagKey, FlagKind, FlagVariant,
        StoredValue, VariantDisplay, VariantFormatter, VariantUpdater,
    },
    error::FlagshiftResult,
};

/// A flag rendered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagView {
    pub key: FlagKey,
    pub kind: FlagKind,
    pub display: VariantDisplay,
    /// Whether the effective value fell back to the default.
    pub is_default_value: bool,
    pub variant: FlagVariant,
}

/// Service for flag operations.
pub struct FlagService {
    store: Box<dyn FlagStore>,
}

impl FlagService {
    /// Create a new flag service.
    pub fn new(store: Box<dyn FlagStore>) -> Self {
        Self { store }
    }

    /// Get a flag, failing when it does not exist.
    pub fn get(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<FlagVariant> {
        validator::validate_environment(environment)?;
        self.store
            .get(environment, key)?
            .ok_or_else(|| not_found(environment, key).into())
    }

    /// Every flag of an environment, rendered, in key order.
    pub fn list(&self, environment: &str) -> FlagshiftResult<Vec<FlagView>> {
        validator::validate_environment(environment)?;
        Ok(self
            .store
            .list(environment)?
            .into_iter()
            .map(|(key, variant)| view(key, variant, Bucketing::Random))
            .collect())
    }

    /// One flag rendered, resolving AB-TEST flags with `bucketing`.
    pub fn describe(
        &self,
        environment: &str,
        key: &FlagKey,
        bucketing: Bucketing<'_>,
    ) -> FlagshiftResult<FlagView> {
        let variant = self.get(environment, key)?;
        Ok(view(key.clone(), variant, bucketing))
    }

    /// Environments that hold flags.
    pub fn environments(&self) -> FlagshiftResult<Vec<String>> {
        self.store.environments()
    }

    /// Define a new flag.
    #[instrument(skip(self, variant), fields(kind = %variant.kind()))]
    pub fn create(
        &self,
        environment: &str,
        key: &FlagKey,
        variant: FlagVariant,
    ) -> FlagshiftResult<()> {
        validator::validate_environment(environment)?;
        validator::validate_variant(key.as_str(), &variant)?;
        if self.store.get(environment, key)?.is_some() {
            return Err(DomainError::FlagExists {
                environment: environment.to_string(),
                key: key.to_string(),
            }
            .into());
        }
        self.store.put(environment, key, variant)?;
        info!("Flag created");
        Ok(())
    }

    /// Replace constraints and default of an existing flag, keeping its
    /// override.
    #[instrument(skip(self, update))]
    pub fn update_schema(
        &self,
        environment: &str,
        key: &FlagKey,
        update: &FlagVariant,
    ) -> FlagshiftResult<FlagVariant> {
        let current = self.get(environment, key)?;
        let merged = VariantUpdater::update_schema(&current, update)?;
        validator::validate_variant(key.as_str(), &merged)?;
        self.store.put(environment, key, merged.clone())?;
        info!("Flag schema updated");
        Ok(merged)
    }

    /// Store an override parsed from `raw` according to the flag's kind.
    ///
    /// BOOLEAN and INTEGER parse as such, TAG takes a comma-separated list,
    /// STRING and ENUM take `raw` verbatim.
    #[instrument(skip(self))]
    pub fn set_value(
        &self,
        environment: &str,
        key: &FlagKey,
        raw: &str,
    ) -> FlagshiftResult<FlagVariant> {
        let current = self.get(environment, key)?;
        let update = parse_override(key, &current, raw)?;
        self.store_value(environment, key, &current, &update)
    }

    /// Drop the override so the default applies again.
    #[instrument(skip(self))]
    pub fn unset_value(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<FlagVariant> {
        let current = self.get(environment, key)?;
        let update = current.without_value();
        self.store_value(environment, key, &current, &update)
    }

    /// Remove a flag.
    #[instrument(skip(self))]
    pub fn delete(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<()> {
        self.get(environment, key)?;
        self.store.delete(environment, key)?;
        info!("Flag deleted");
        Ok(())
    }

    fn store_value(
        &self,
        environment: &str,
        key: &FlagKey,
        current: &FlagVariant,
        update: &FlagVariant,
    ) -> FlagshiftResult<FlagVariant> {
        let merged = VariantUpdater::update_value(current, update)?;
        validator::validate_value(key.as_str(), &merged)?;
        self.store.put(environment, key, merged.clone())?;
        info!("Flag value updated");
        Ok(merged)
    }
}

fn view(key: FlagKey, variant: FlagVariant, bucketing: Bucketing<'_>) -> FlagView {
    let effective = VariantFormatter::effective_value(key.as_str(), &variant, bucketing);
    FlagView {
        kind: variant.kind(),
        display: VariantDisplay {
            schema_text: VariantFormatter::schema_text(&variant),
            default_text: VariantFormatter::default_text(&variant),
            effective_value_text: effective.text,
        },
        is_default_value: effective.is_default_value,
        key,
        variant,
    }
}

fn not_found(environment: &str, key: &FlagKey) -> DomainError {
    DomainError::FlagNotFound {
        environment: environment.to_string(),
        key: key.to_string(),
    }
}

fn parse_override(
    key: &FlagKey,
    current: &FlagVariant,
    raw: &str,
) -> Result<FlagVariant, DomainError> {
    let invalid = |reason: String| DomainError::InvalidValue {
        key: key.to_string(),
        reason,
    };

    let update = match current {
        FlagVariant::Boolean(f) => {
            let value = raw
                .parse::<bool>()
                .map_err(|_| invalid(format!("'{raw}' is not true or false")))?;
            FlagVariant::Boolean(f.with_value(value))
        }
        FlagVariant::Integer(f) => {
            let value = raw
                .parse::<i64>()
                .map_err(|_| invalid(format!("'{raw}' is not a whole number")))?;
            FlagVariant::Integer(f.with_value(value))
        }
        FlagVariant::String(f) => FlagVariant::String(f.with_value(raw.to_string())),
        FlagVariant::Enum(f) => FlagVariant::Enum(f.with_value(raw.to_string())),
        FlagVariant::Tag(f) => FlagVariant::Tag(
            f.with_value(
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect(),
            ),
        ),
        FlagVariant::AbTest(_) => {
            return Err(invalid(
                "AB-TEST flags have no stored value; change chanceBPercent instead".into(),
            ));
        }
    };
    Ok(update)
}
