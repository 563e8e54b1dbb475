//! The migration diff engine.
//!
//! Compares a validated migration file against the current flags of an
//! environment and emits the ordered steps that turn one into the other.
//!
//! ## Step shapes
//!
//! | situation                     | steps                                       |
//! |-------------------------------|---------------------------------------------|
//! | missing                       | CREATE, then SET (after CREATE, indent 1)   |
//! | kind changed                  | DELETE, CREATE (indent 1), SET (indent 2)   |
//! | schema changed                | UPDATE, then SET (after UPDATE, indent 1)   |
//! | only value changed            | SET                                         |
//! | identical                     | nothing                                     |
//! | no longer in the file         | DELETE, after every file-driven step        |
//!
//! The trailing SET is only emitted when the target declares a value.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{
    compare::VariantComparer,
    entities::{
        migration::{MigrationStep, MigrationSummary, StepMode},
        variant::FlagVariant,
    },
    validation::ValidatedMigrationFile,
    value_objects::FlagKey,
};

/// Accumulates steps and hands out ids starting at 1.
///
/// One builder per planning call, so planning stays a pure function.
#[derive(Debug)]
pub struct PlanBuilder {
    next_id: u32,
    steps: Vec<MigrationStep>,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self {
            next_id: 1,
            steps: Vec::new(),
        }
    }
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step and return its id.
    pub fn push(
        &mut self,
        mode: StepMode,
        flag_key: &FlagKey,
        flag: Option<&FlagVariant>,
        dependent_id: Option<u32>,
        indent: Option<u8>,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.steps.push(MigrationStep {
            id,
            mode,
            flag_key: flag_key.clone(),
            flag: flag.cloned(),
            dependent_id,
            indent,
        });
        id
    }

    /// SET_VALUE after `parent` when the target carries an override.
    fn push_value_if_declared(
        &mut self,
        key: &FlagKey,
        target: &FlagVariant,
        parent: u32,
        indent: u8,
    ) {
        if target.declares_value() {
            self.push(
                StepMode::SetValue,
                key,
                Some(target),
                Some(parent),
                Some(indent),
            );
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self) -> Vec<MigrationStep> {
        self.steps
    }
}

pub struct MigrationPlanner;

impl MigrationPlanner {
    /// Plan the steps that move `current` to the state described by `file`.
    ///
    /// File keys are processed in file order; stale keys are deleted last,
    /// in `current`'s (sorted) order.
    pub fn plan_migration(
        file: &ValidatedMigrationFile,
        current: &BTreeMap<FlagKey, FlagVariant>,
    ) -> MigrationSummary {
        let mut plan = PlanBuilder::new();

        for (key, target) in file.flags() {
            Self::plan_flag(&mut plan, key, target, current.get(key));
        }

        let targeted: BTreeSet<&FlagKey> = file.flags().iter().map(|(k, _)| k).collect();
        for key in current.keys().filter(|k| !targeted.contains(k)) {
            plan.push(StepMode::Delete, key, None, None, None);
        }

        debug!(
            environment = file.environment(),
            steps = plan.len(),
            "Migration planned"
        );

        MigrationSummary {
            environment: file.environment().to_string(),
            version: file.version(),
            created_at: file.created_at(),
            steps: plan.finish(),
        }
    }

    fn plan_flag(
        plan: &mut PlanBuilder,
        key: &FlagKey,
        target: &FlagVariant,
        existing: Option<&FlagVariant>,
    ) {
        let Some(existing) = existing else {
            let create = plan.push(StepMode::CreateDefaultValue, key, Some(target), None, None);
            plan.push_value_if_declared(key, target, create, 1);
            return;
        };

        if existing.kind() != target.kind() {
            let delete = plan.push(StepMode::Delete, key, None, None, None);
            let create = plan.push(
                StepMode::CreateDefaultValue,
                key,
                Some(target),
                Some(delete),
                Some(1),
            );
            plan.push_value_if_declared(key, target, create, 2);
        } else if !VariantComparer::schema_equal(existing, target) {
            let update = plan.push(
                StepMode::UpdateSchemaDefaultValue,
                key,
                Some(target),
                None,
                None,
            );
            plan.push_value_if_declared(key, target, update, 1);
        } else if !VariantComparer::value_equal(existing, target) {
            plan.push(StepMode::SetValue, key, Some(target), None, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{
            migration::MigrationFile,
            variant::{BooleanFlag, EnumFlag, IntegerFlag, StoredValue, StringFlag, TagFlag},
        },
        validation::DomainValidator,
    };
    use chrono::Utc;

    fn key(raw: &str) -> FlagKey {
        FlagKey::parse(raw).unwrap()
    }

    fn validated(flags: &[(&str, FlagVariant)]) -> ValidatedMigrationFile {
        let file = flags
            .iter()
            .fold(MigrationFile::new("staging", "1.0.0", Utc::now()), |f, (k, v)| {
                f.with_flag(*k, v.clone())
            });
        DomainValidator::validate_migration_file(&file).unwrap()
    }

    fn current(flags: &[(&str, FlagVariant)]) -> BTreeMap<FlagKey, FlagVariant> {
        flags.iter().map(|(k, v)| (key(k), v.clone())).collect()
    }

    fn shape(summary: &MigrationSummary) -> Vec<(u32, StepMode, &str, Option<u32>, Option<u8>)> {
        summary
            .steps
            .iter()
            .map(|s| (s.id, s.mode, s.flag_key.as_str(), s.dependent_id, s.indent))
            .collect()
    }

    fn assert_ids_well_formed(summary: &MigrationSummary) {
        for pair in summary.steps.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
        for (i, step) in summary.steps.iter().enumerate() {
            if let Some(dep) = step.dependent_id {
                assert!(summary.steps[..i].iter().any(|s| s.id == dep));
            }
        }
    }

    // ── creation ─────────────────────────────────────────────────────────

    #[test]
    fn new_flag_with_value_creates_then_sets() {
        let target = FlagVariant::Integer(IntegerFlag::new(0, 10, 5).with_value(8));
        let file = validated(&[("a/new", target.clone())]);

        let summary = MigrationPlanner::plan_migration(&file, &BTreeMap::new());

        assert_eq!(
            shape(&summary),
            vec![
                (1, StepMode::CreateDefaultValue, "a/new", None, None),
                (2, StepMode::SetValue, "a/new", Some(1), Some(1)),
            ]
        );
        assert_eq!(summary.steps[0].flag.as_ref(), Some(&target));
        assert_eq!(summary.steps[1].flag.as_ref(), Some(&target));
    }

    #[test]
    fn new_flag_without_value_only_creates() {
        let file = validated(&[("a/new", FlagVariant::Boolean(BooleanFlag::new(true)))]);
        let summary = MigrationPlanner::plan_migration(&file, &BTreeMap::new());
        assert_eq!(
            shape(&summary),
            vec![(1, StepMode::CreateDefaultValue, "a/new", None, None)]
        );
    }

    // ── unchanged ────────────────────────────────────────────────────────

    #[test]
    fn identical_flag_emits_nothing() {
        let flag = FlagVariant::Tag(
            TagFlag::new(["x", "y", "z"]).with_value(["y", "x"].iter().map(|s| s.to_string()).collect()),
        );
        let file = validated(&[("t", flag.clone())]);
        let summary = MigrationPlanner::plan_migration(&file, &current(&[("t", flag)]));
        assert!(summary.is_empty());
    }

    // ── type change ──────────────────────────────────────────────────────

    #[test]
    fn kind_change_deletes_and_recreates() {
        let existing = FlagVariant::Integer(IntegerFlag::new(0, 10, 5));
        let target = FlagVariant::String(StringFlag::new("x").with_value("y".into()));
        let file = validated(&[("a/b", target)]);

        let summary = MigrationPlanner::plan_migration(&file, &current(&[("a/b", existing)]));

        assert_eq!(
            shape(&summary),
            vec![
                (1, StepMode::Delete, "a/b", None, None),
                (2, StepMode::CreateDefaultValue, "a/b", Some(1), Some(1)),
                (3, StepMode::SetValue, "a/b", Some(2), Some(2)),
            ]
        );
        assert!(summary.steps[0].flag.is_none());
    }

    // ── schema and value changes ─────────────────────────────────────────

    #[test]
    fn schema_only_change_updates_in_place() {
        let existing = FlagVariant::Enum(EnumFlag::new(["A", "B"], "A"));
        let target = FlagVariant::Enum(EnumFlag::new(["A", "B", "C"], "A"));
        let file = validated(&[("e", target)]);

        let summary = MigrationPlanner::plan_migration(&file, &current(&[("e", existing)]));

        assert_eq!(
            shape(&summary),
            vec![(1, StepMode::UpdateSchemaDefaultValue, "e", None, None)]
        );
    }

    #[test]
    fn schema_change_with_value_sets_after_update() {
        let existing = FlagVariant::Integer(IntegerFlag::new(0, 10, 5));
        let target = FlagVariant::Integer(IntegerFlag::new(0, 20, 5).with_value(15));
        let file = validated(&[("n", target)]);

        let summary = MigrationPlanner::plan_migration(&file, &current(&[("n", existing)]));

        assert_eq!(
            shape(&summary),
            vec![
                (1, StepMode::UpdateSchemaDefaultValue, "n", None, None),
                (2, StepMode::SetValue, "n", Some(1), Some(1)),
            ]
        );
    }

    #[test]
    fn value_only_change_sets_alone() {
        let existing = FlagVariant::Boolean(BooleanFlag::new(false));
        let target = FlagVariant::Boolean(BooleanFlag::new(false).with_value(true));
        let file = validated(&[("b", target)]);

        let summary = MigrationPlanner::plan_migration(&file, &current(&[("b", existing)]));

        assert_eq!(shape(&summary), vec![(1, StepMode::SetValue, "b", None, None)]);
    }

    // ── deletion ─────────────────────────────────────────────────────────

    #[test]
    fn stale_keys_are_deleted_last() {
        let x = FlagVariant::Boolean(BooleanFlag::new(true));
        let y = FlagVariant::Boolean(BooleanFlag::new(false));
        let file = validated(&[("x", x.clone())]);

        let summary = MigrationPlanner::plan_migration(&file, &current(&[("x", x), ("y", y)]));

        assert_eq!(shape(&summary), vec![(1, StepMode::Delete, "y", None, None)]);
    }

    #[test]
    fn deletions_follow_file_driven_steps() {
        let file = validated(&[
            ("z/new", FlagVariant::Boolean(BooleanFlag::new(true).with_value(false))),
            ("m/changed", FlagVariant::Integer(IntegerFlag::new(0, 9, 3))),
        ]);
        let existing = current(&[
            ("a/stale", FlagVariant::Boolean(BooleanFlag::new(true))),
            ("m/changed", FlagVariant::Integer(IntegerFlag::new(0, 9, 1))),
            ("b/stale", FlagVariant::Boolean(BooleanFlag::new(true))),
        ]);

        let summary = MigrationPlanner::plan_migration(&file, &existing);

        assert_eq!(
            shape(&summary),
            vec![
                (1, StepMode::CreateDefaultValue, "z/new", None, None),
                (2, StepMode::SetValue, "z/new", Some(1), Some(1)),
                (3, StepMode::UpdateSchemaDefaultValue, "m/changed", None, None),
                (4, StepMode::Delete, "a/stale", None, None),
                (5, StepMode::Delete, "b/stale", None, None),
            ]
        );
        assert_ids_well_formed(&summary);
    }

    // ── summary metadata and ids ─────────────────────────────────────────

    #[test]
    fn summary_copies_file_metadata() {
        let file = validated(&[]);
        let summary = MigrationPlanner::plan_migration(&file, &BTreeMap::new());
        assert_eq!(summary.environment, "staging");
        assert_eq!(summary.version.to_string(), "1.0.0");
        assert_eq!(summary.created_at, file.created_at());
        assert!(summary.is_empty());
    }

    #[test]
    fn ids_increase_and_dependencies_point_backwards() {
        let file = validated(&[
            ("a", FlagVariant::String(StringFlag::new("s").with_value("t".into()))),
            ("b", FlagVariant::Integer(IntegerFlag::new(0, 5, 1).with_value(2))),
            ("c", FlagVariant::Enum(EnumFlag::new(["A"], "A").with_value("A".into()))),
            ("d", FlagVariant::Boolean(BooleanFlag::new(true).with_value(false))),
        ]);
        let existing = current(&[
            ("a", FlagVariant::Integer(IntegerFlag::new(0, 1, 0))),
            ("b", FlagVariant::Integer(IntegerFlag::new(0, 9, 1))),
            ("c", FlagVariant::Enum(EnumFlag::new(["A"], "A"))),
            ("q", FlagVariant::Boolean(BooleanFlag::new(false))),
        ]);

        let summary = MigrationPlanner::plan_migration(&file, &existing);

        assert_eq!(summary.steps.len(), 9);
        assert_ids_well_formed(&summary);
        assert_eq!(summary.steps.last().map(|s| s.mode), Some(StepMode::Delete));
    }

    #[test]
    fn planning_is_reentrant() {
        let file = validated(&[("k", FlagVariant::Boolean(BooleanFlag::new(true)))]);
        let first = MigrationPlanner::plan_migration(&file, &BTreeMap::new());
        let second = MigrationPlanner::plan_migration(&file, &BTreeMap::new());
        assert_eq!(first, second);
        assert_eq!(second.steps[0].id, 1);
    }
}
