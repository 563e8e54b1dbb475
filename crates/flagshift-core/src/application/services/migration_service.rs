//! Migration Service - main application orchestrator.
//!
//! This service coordinates the migration workflow:
//! 1. Validate the migration file (all-or-nothing)
//! 2. Snapshot the environment from the store and plan the diff
//! 3. Apply the plan step by step, stopping at the first failure
//!
//! There is no rollback. A failed apply reports how many steps landed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{ApplicationError, ports::FlagStore},
    domain::{
        DomainError, DomainValidator as validator, FlagKey, FlagVariant, MigrationFile,
        MigrationPlanner, MigrationStep, MigrationSummary, SemVer, StepMode,
        ValidatedMigrationFile, VariantUpdater,
    },
    error::{FlagshiftError, FlagshiftResult},
};

/// Outcome of a fully applied plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Correlates the log lines of one apply run.
    pub run_id: Uuid,
    pub environment: String,
    /// Ids of the applied steps, in execution order.
    pub applied: Vec<u32>,
}

/// Validates, plans and applies migrations against a [`FlagStore`].
pub struct MigrationService {
    store: Box<dyn FlagStore>,
}

impl MigrationService {
    /// Create a new migration service with the given store.
    pub fn new(store: Box<dyn FlagStore>) -> Self {
        Self { store }
    }

    /// Validate an untrusted migration file.
    pub fn validate(&self, file: &MigrationFile) -> FlagshiftResult<ValidatedMigrationFile> {
        Ok(validator::validate_migration_file(file)?)
    }

    /// Validate `file` and diff it against the stored environment it names.
    #[instrument(skip_all, fields(environment = %file.environment, version = %file.version))]
    pub fn plan(&self, file: &MigrationFile) -> FlagshiftResult<MigrationSummary> {
        let validated = self.validate(file)?;
        let current = self.store.list(validated.environment())?;
        debug!(current = current.len(), "Loaded current flags");

        let summary = MigrationPlanner::plan_migration(&validated, &current);
        info!(steps = summary.steps.len(), "Plan ready");
        Ok(summary)
    }

    /// Apply every step of `summary` in order.
    pub fn apply(&self, summary: &MigrationSummary) -> FlagshiftResult<ApplyReport> {
        self.apply_with(summary, |_| {})
    }

    /// Apply every step of `summary` in order, calling `on_step` after each
    /// step lands.
    ///
    /// Step ids must be strictly increasing. A step whose `dependentId` has
    /// not completed is refused. The first failing step aborts the run with
    /// [`ApplicationError::StepFailed`]; earlier steps stay applied.
    #[instrument(
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            environment = %summary.environment,
            steps = summary.steps.len()
        )
    )]
    pub fn apply_with<F>(
        &self,
        summary: &MigrationSummary,
        mut on_step: F,
    ) -> FlagshiftResult<ApplyReport>
    where
        F: FnMut(&MigrationStep),
    {
        validator::validate_environment(&summary.environment)?;
        check_ordering(summary)?;

        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        info!("Applying migration");

        let mut completed = HashSet::with_capacity(summary.steps.len());
        let mut applied = Vec::with_capacity(summary.steps.len());

        for (index, step) in summary.steps.iter().enumerate() {
            if let Some(dependent_id) = step.dependent_id {
                if !completed.contains(&dependent_id) {
                    return Err(ApplicationError::DependencyNotSatisfied {
                        step_id: step.id,
                        dependent_id,
                    }
                    .into());
                }
            }

            if let Err(e) = self.apply_step(&summary.environment, step) {
                warn!(step = %step, error = %e, applied = applied.len(), "Step failed");
                return Err(ApplicationError::StepFailed {
                    step_id: step.id,
                    index,
                    mode: step.mode,
                    key: step.flag_key.to_string(),
                    applied: applied.len(),
                    reason: e.to_string(),
                }
                .into());
            }

            debug!(step = %step, "Step applied");
            completed.insert(step.id);
            applied.push(step.id);
            on_step(step);
        }

        info!(applied = applied.len(), "Migration applied");
        Ok(ApplyReport {
            run_id,
            environment: summary.environment.clone(),
            applied,
        })
    }

    /// Execute one step against the store.
    pub fn apply_step(&self, environment: &str, step: &MigrationStep) -> FlagshiftResult<()> {
        let key = &step.flag_key;
        match step.mode {
            StepMode::CreateDefaultValue => {
                let target = payload(step)?;
                self.store.put(environment, key, target.without_value())
            }
            StepMode::UpdateSchemaDefaultValue => {
                let current = self.current(environment, key)?;
                let merged = VariantUpdater::update_schema(&current, payload(step)?)?;
                validator::validate_schema(key.as_str(), &merged)?;
                self.store.put(environment, key, merged)
            }
            StepMode::SetValue => {
                let current = self.current(environment, key)?;
                let merged = VariantUpdater::update_value(&current, payload(step)?)?;
                validator::validate_value(key.as_str(), &merged)?;
                self.store.put(environment, key, merged)
            }
            StepMode::Delete => self.store.delete(environment, key),
        }
    }

    /// Dump an environment as a migration file that would recreate it.
    #[instrument(skip(self, created_at))]
    pub fn export(
        &self,
        environment: &str,
        version: SemVer,
        created_at: DateTime<Utc>,
    ) -> FlagshiftResult<MigrationFile> {
        validator::validate_environment(environment)?;
        let current = self.store.list(environment)?;
        info!(flags = current.len(), "Exporting environment");

        let mut file = MigrationFile::new(environment, version.to_string(), created_at);
        for (key, variant) in current {
            file = file.with_flag(key.as_str(), variant);
        }
        Ok(file)
    }

    fn current(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<FlagVariant> {
        self.store.get(environment, key)?.ok_or_else(|| {
            DomainError::FlagNotFound {
                environment: environment.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }
}

fn payload(step: &MigrationStep) -> FlagshiftResult<&FlagVariant> {
    step.flag.as_ref().ok_or_else(|| {
        FlagshiftError::from(ApplicationError::Decode {
            what: format!("step #{}", step.id),
            reason: format!("{} step carries no flag definition", step.mode),
        })
    })
}

fn check_ordering(summary: &MigrationSummary) -> FlagshiftResult<()> {
    for pair in summary.steps.windows(2) {
        if pair[0].id >= pair[1].id {
            return Err(ApplicationError::Decode {
                what: "migration summary".into(),
                reason: format!(
                    "step ids must be strictly increasing, found #{} before #{}",
                    pair[0].id, pair[1].id
                ),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mockall::Sequence;

    use super::*;
    use crate::application::ports::MockFlagStore;
    use crate::domain::{BooleanFlag, EnumFlag, IntegerFlag, StoredValue, StringFlag};

    fn key(raw: &str) -> FlagKey {
        FlagKey::parse(raw).unwrap()
    }

    fn step(
        id: u32,
        mode: StepMode,
        flag_key: &str,
        flag: Option<FlagVariant>,
        dependent_id: Option<u32>,
    ) -> MigrationStep {
        MigrationStep {
            id,
            mode,
            flag_key: key(flag_key),
            flag,
            dependent_id,
            indent: dependent_id.map(|_| 1),
        }
    }

    fn summary(steps: Vec<MigrationStep>) -> MigrationSummary {
        MigrationSummary {
            environment: "dev".into(),
            version: SemVer::new(1, 0, 0),
            created_at: Utc::now(),
            steps,
        }
    }

    // ── plan ─────────────────────────────────────────────────────────────

    #[test]
    fn plan_diffs_against_the_named_environment() {
        let mut store = MockFlagStore::new();
        store
            .expect_list()
            .withf(|env: &str| env == "production")
            .times(1)
            .returning(|_| {
                let mut current = BTreeMap::new();
                current.insert(
                    FlagKey::parse("old/flag").unwrap(),
                    FlagVariant::Boolean(BooleanFlag::new(true)),
                );
                Ok(current)
            });
        let service = MigrationService::new(Box::new(store));

        let file = MigrationFile::new("production", "2.0.0", Utc::now())
            .with_flag("new/flag", FlagVariant::Integer(IntegerFlag::new(0, 3, 1)));
        let plan = service.plan(&file).unwrap();

        let modes: Vec<_> = plan.steps.iter().map(|s| s.mode).collect();
        assert_eq!(modes, [StepMode::CreateDefaultValue, StepMode::Delete]);
        assert_eq!(plan.version.to_string(), "2.0.0");
    }

    #[test]
    fn invalid_file_never_reaches_the_store() {
        let mut store = MockFlagStore::new();
        store.expect_list().never();
        let service = MigrationService::new(Box::new(store));

        let file = MigrationFile::new("dev", "1.0.0", Utc::now())
            .with_flag("bad/range", FlagVariant::Integer(IntegerFlag::new(10, 5, 7)));
        let err = service.plan(&file).unwrap_err();

        assert!(matches!(
            err,
            FlagshiftError::Domain(DomainError::InvalidSchema { ref key, .. }) if key == "bad/range"
        ));
    }

    // ── apply ────────────────────────────────────────────────────────────

    #[test]
    fn create_then_set_writes_default_first() {
        let target = FlagVariant::String(StringFlag::new("x").with_value("y".into()));
        let created = target.without_value();
        let mut seq = Sequence::new();
        let mut store = MockFlagStore::new();

        let expected_create = created.clone();
        store
            .expect_put()
            .withf(move |_: &str, k: &FlagKey, v: &FlagVariant| {
                k.as_str() == "s" && *v == expected_create
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(Some(created.clone())));
        let expected_set = target.clone();
        store
            .expect_put()
            .withf(move |_: &str, _: &FlagKey, v: &FlagVariant| *v == expected_set)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![
            step(1, StepMode::CreateDefaultValue, "s", Some(target.clone()), None),
            step(2, StepMode::SetValue, "s", Some(target), Some(1)),
        ]);

        let mut seen = Vec::new();
        let report = service.apply_with(&plan, |s| seen.push(s.id)).unwrap();

        assert_eq!(report.applied, [1, 2]);
        assert_eq!(seen, [1, 2]);
        assert_eq!(report.environment, "dev");
    }

    #[test]
    fn schema_update_keeps_stored_override() {
        let stored = FlagVariant::Enum(EnumFlag::new(["A", "B"], "A").with_value("B".into()));
        let target = FlagVariant::Enum(EnumFlag::new(["A", "B", "C"], "C"));
        let expected = FlagVariant::Enum(EnumFlag::new(["A", "B", "C"], "C").with_value("B".into()));

        let mut store = MockFlagStore::new();
        store
            .expect_get()
            .returning(move |_, _| Ok(Some(stored.clone())));
        store
            .expect_put()
            .withf(move |_: &str, _: &FlagKey, v: &FlagVariant| *v == expected)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![step(
            1,
            StepMode::UpdateSchemaDefaultValue,
            "e",
            Some(target),
            None,
        )]);
        service.apply(&plan).unwrap();
    }

    #[test]
    fn first_failure_stops_the_run() {
        let flag = FlagVariant::Boolean(BooleanFlag::new(true));
        let mut store = MockFlagStore::new();
        store.expect_delete().times(1).returning(|_, _| Ok(()));
        store.expect_put().times(1).returning(|_, _, _| {
            Err(ApplicationError::store("put", "disk full").into())
        });
        store.expect_get().never();

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![
            step(1, StepMode::Delete, "gone", None, None),
            step(2, StepMode::CreateDefaultValue, "b", Some(flag.clone()), None),
            step(3, StepMode::SetValue, "b", Some(flag), Some(2)),
        ]);

        let err = service.apply(&plan).unwrap_err();
        match err {
            FlagshiftError::Application(ApplicationError::StepFailed {
                step_id,
                index,
                applied,
                ref reason,
                ..
            }) => {
                assert_eq!(step_id, 2);
                assert_eq!(index, 1);
                assert_eq!(applied, 1);
                assert!(reason.contains("disk full"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_is_refused() {
        let flag = FlagVariant::Boolean(BooleanFlag::new(true));
        let mut store = MockFlagStore::new();
        store.expect_put().never();
        store.expect_get().never();

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![step(2, StepMode::SetValue, "b", Some(flag), Some(1))]);

        let err = service.apply(&plan).unwrap_err();
        assert_eq!(
            err,
            FlagshiftError::Application(ApplicationError::DependencyNotSatisfied {
                step_id: 2,
                dependent_id: 1
            })
        );
    }

    #[test]
    fn out_of_order_ids_are_rejected_up_front() {
        let mut store = MockFlagStore::new();
        store.expect_delete().never();

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![
            step(2, StepMode::Delete, "a", None, None),
            step(1, StepMode::Delete, "b", None, None),
        ]);

        assert!(matches!(
            service.apply(&plan),
            Err(FlagshiftError::Application(ApplicationError::Decode { .. }))
        ));
    }

    #[test]
    fn set_on_missing_flag_fails_the_step() {
        let mut store = MockFlagStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store.expect_put().never();

        let service = MigrationService::new(Box::new(store));
        let plan = summary(vec![step(
            1,
            StepMode::SetValue,
            "nope",
            Some(FlagVariant::Integer(IntegerFlag::new(0, 1, 0).with_value(1))),
            None,
        )]);

        let err = service.apply(&plan).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    // ── export ───────────────────────────────────────────────────────────

    #[test]
    fn export_lists_flags_in_key_order() {
        let mut store = MockFlagStore::new();
        store.expect_list().returning(|_| {
            Ok([("b", true), ("a", false)]
                .into_iter()
                .map(|(k, d)| {
                    (
                        FlagKey::parse(k).unwrap(),
                        FlagVariant::Boolean(BooleanFlag::new(d)),
                    )
                })
                .collect())
        });

        let service = MigrationService::new(Box::new(store));
        let file = service.export("qa", SemVer::new(3, 1, 4), Utc::now()).unwrap();

        let keys: Vec<_> = file.flags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(file.version, "3.1.4");
        assert!(service.validate(&file).is_ok());
    }
}
