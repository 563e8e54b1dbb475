//! Partial updates of a flag variant.
//!
//! Each merge lists the fields it takes from each side explicitly. A field
//! added to a variant struct later must be placed on one side or the other
//! here, or the struct literal stops compiling.

use crate::domain::{
    entities::variant::{
        AbTestFlag, BooleanFlag, EnumFlag, FlagVariant, IntegerFlag, StringFlag, TagFlag,
    },
    error::DomainError,
};

pub struct VariantUpdater;

impl VariantUpdater {
    /// Adopt `update`'s constraints and default; keep `current`'s override.
    pub fn update_schema(
        current: &FlagVariant,
        update: &FlagVariant,
    ) -> Result<FlagVariant, DomainError> {
        let merged = match (current, update) {
            (FlagVariant::Boolean(cur), FlagVariant::Boolean(new)) => {
                FlagVariant::Boolean(BooleanFlag {
                    is_kill_switch: new.is_kill_switch,
                    default_value: new.default_value,
                    value_exists: cur.value_exists,
                    value: cur.value,
                })
            }
            (FlagVariant::Integer(cur), FlagVariant::Integer(new)) => {
                FlagVariant::Integer(IntegerFlag {
                    min_value: new.min_value,
                    max_value: new.max_value,
                    default_value: new.default_value,
                    value_exists: cur.value_exists,
                    value: cur.value,
                })
            }
            (FlagVariant::String(cur), FlagVariant::String(new)) => {
                FlagVariant::String(StringFlag {
                    max_length: new.max_length,
                    reg_exp: new.reg_exp.clone(),
                    default_value: new.default_value.clone(),
                    value_exists: cur.value_exists,
                    value: cur.value.clone(),
                })
            }
            (FlagVariant::Enum(cur), FlagVariant::Enum(new)) => FlagVariant::Enum(EnumFlag {
                enum_values: new.enum_values.clone(),
                allow_empty: new.allow_empty,
                default_value: new.default_value.clone(),
                value_exists: cur.value_exists,
                value: cur.value.clone(),
            }),
            (FlagVariant::Tag(cur), FlagVariant::Tag(new)) => FlagVariant::Tag(TagFlag {
                tag_values: new.tag_values.clone(),
                min_count: new.min_count,
                max_count: new.max_count,
                default_value: new.default_value.clone(),
                value_exists: cur.value_exists,
                value: cur.value.clone(),
            }),
            (FlagVariant::AbTest(_), FlagVariant::AbTest(new)) => {
                FlagVariant::AbTest(AbTestFlag {
                    chance_b_percent: new.chance_b_percent,
                })
            }
            _ => return Err(mismatch(current, update)),
        };
        Ok(merged)
    }

    /// Adopt `update`'s `valueExists`/`value`; keep `current`'s definition.
    pub fn update_value(
        current: &FlagVariant,
        update: &FlagVariant,
    ) -> Result<FlagVariant, DomainError> {
        let merged = match (current, update) {
            (FlagVariant::Boolean(cur), FlagVariant::Boolean(new)) => {
                FlagVariant::Boolean(BooleanFlag {
                    is_kill_switch: cur.is_kill_switch,
                    default_value: cur.default_value,
                    value_exists: new.value_exists,
                    value: new.value,
                })
            }
            (FlagVariant::Integer(cur), FlagVariant::Integer(new)) => {
                FlagVariant::Integer(IntegerFlag {
                    min_value: cur.min_value,
                    max_value: cur.max_value,
                    default_value: cur.default_value,
                    value_exists: new.value_exists,
                    value: new.value,
                })
            }
            (FlagVariant::String(cur), FlagVariant::String(new)) => {
                FlagVariant::String(StringFlag {
                    max_length: cur.max_length,
                    reg_exp: cur.reg_exp.clone(),
                    default_value: cur.default_value.clone(),
                    value_exists: new.value_exists,
                    value: new.value.clone(),
                })
            }
            (FlagVariant::Enum(cur), FlagVariant::Enum(new)) => FlagVariant::Enum(EnumFlag {
                enum_values: cur.enum_values.clone(),
                allow_empty: cur.allow_empty,
                default_value: cur.default_value.clone(),
                value_exists: new.value_exists,
                value: new.value.clone(),
            }),
            (FlagVariant::Tag(cur), FlagVariant::Tag(new)) => FlagVariant::Tag(TagFlag {
                tag_values: cur.tag_values.clone(),
                min_count: cur.min_count,
                max_count: cur.max_count,
                default_value: cur.default_value.clone(),
                value_exists: new.value_exists,
                value: new.value.clone(),
            }),
            // No stored value to take over.
            (FlagVariant::AbTest(cur), FlagVariant::AbTest(_)) => FlagVariant::AbTest(cur.clone()),
            _ => return Err(mismatch(current, update)),
        };
        Ok(merged)
    }
}

fn mismatch(current: &FlagVariant, update: &FlagVariant) -> DomainError {
    DomainError::TypeMismatch {
        current: current.kind(),
        override_kind: update.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{entities::variant::StoredValue, value_objects::FlagKind};

    #[test]
    fn schema_update_keeps_current_override() {
        let current = FlagVariant::Integer(IntegerFlag::new(0, 10, 5).with_value(7));
        let update = FlagVariant::Integer(IntegerFlag::new(0, 100, 50));

        let merged = VariantUpdater::update_schema(&current, &update).unwrap();
        assert_eq!(
            merged,
            FlagVariant::Integer(IntegerFlag::new(0, 100, 50).with_value(7))
        );
    }

    #[test]
    fn value_update_keeps_current_definition() {
        let current = FlagVariant::Enum(EnumFlag::new(["A", "B"], "A"));
        let update = FlagVariant::Enum(EnumFlag::new(["X"], "X").with_value("B".into()));

        let merged = VariantUpdater::update_value(&current, &update).unwrap();
        assert_eq!(
            merged,
            FlagVariant::Enum(EnumFlag::new(["A", "B"], "A").with_value("B".into()))
        );
    }

    #[test]
    fn value_update_can_clear_override() {
        let current = FlagVariant::Boolean(BooleanFlag::new(false).kill_switch().with_value(true));
        let update = FlagVariant::Boolean(BooleanFlag::new(false));

        let merged = VariantUpdater::update_value(&current, &update).unwrap();
        assert_eq!(
            merged,
            FlagVariant::Boolean(BooleanFlag::new(false).kill_switch())
        );
    }

    #[test]
    fn ab_test_schema_update_takes_new_chance() {
        let current = FlagVariant::AbTest(AbTestFlag::new(10.0));
        let update = FlagVariant::AbTest(AbTestFlag::new(90.0));
        assert_eq!(
            VariantUpdater::update_schema(&current, &update).unwrap(),
            update
        );
        assert_eq!(
            VariantUpdater::update_value(&current, &update).unwrap(),
            current
        );
    }

    #[test]
    fn mismatched_kinds_name_both() {
        let current = FlagVariant::Integer(IntegerFlag::new(0, 1, 0));
        let update = FlagVariant::String(StringFlag::new("x"));

        let err = VariantUpdater::update_value(&current, &update).unwrap_err();
        assert_eq!(
            err,
            DomainError::TypeMismatch {
                current: FlagKind::Integer,
                override_kind: FlagKind::String,
            }
        );
        assert!(err.to_string().contains("STRING"));
        assert!(err.to_string().contains("INTEGER"));
        assert!(VariantUpdater::update_schema(&current, &update).is_err());
    }
}
