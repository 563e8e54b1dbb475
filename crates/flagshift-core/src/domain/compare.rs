//! Structural equality between two flag variants.
//!
//! Schema and value are compared independently so the planner can tell a
//! constraint change from an override change. Both predicates assume the
//! two variants share a kind; variants of different kinds are never equal.

use crate::domain::entities::variant::{FlagVariant, StoredValue};

pub struct VariantComparer;

impl VariantComparer {
    /// Equality of every descriptive field: constraints, ordered choices,
    /// kill-switch, chance and default. `valueExists`/`value` are ignored.
    pub fn schema_equal(a: &FlagVariant, b: &FlagVariant) -> bool {
        match (a, b) {
            (FlagVariant::Boolean(a), FlagVariant::Boolean(b)) => {
                a.is_kill_switch == b.is_kill_switch && a.default_value == b.default_value
            }
            (FlagVariant::Integer(a), FlagVariant::Integer(b)) => {
                a.min_value == b.min_value
                    && a.max_value == b.max_value
                    && a.default_value == b.default_value
            }
            (FlagVariant::String(a), FlagVariant::String(b)) => {
                a.max_length == b.max_length
                    && a.reg_exp == b.reg_exp
                    && a.default_value == b.default_value
            }
            (FlagVariant::Enum(a), FlagVariant::Enum(b)) => {
                a.enum_values == b.enum_values
                    && a.allow_empty == b.allow_empty
                    && a.default_value == b.default_value
            }
            (FlagVariant::Tag(a), FlagVariant::Tag(b)) => {
                a.tag_values == b.tag_values
                    && a.min_count == b.min_count
                    && a.max_count == b.max_count
                    && a.default_value == b.default_value
            }
            (FlagVariant::AbTest(a), FlagVariant::AbTest(b)) => {
                a.chance_b_percent == b.chance_b_percent
            }
            _ => false,
        }
    }

    /// Equality of `valueExists` plus the resolved value. TAG values are
    /// sets, so order and duplicates do not matter.
    pub fn value_equal(a: &FlagVariant, b: &FlagVariant) -> bool {
        match (a, b) {
            (FlagVariant::Boolean(a), FlagVariant::Boolean(b)) => stored_equal(a, b),
            (FlagVariant::Integer(a), FlagVariant::Integer(b)) => stored_equal(a, b),
            (FlagVariant::String(a), FlagVariant::String(b)) => stored_equal(a, b),
            (FlagVariant::Enum(a), FlagVariant::Enum(b)) => stored_equal(a, b),
            (FlagVariant::Tag(a), FlagVariant::Tag(b)) => stored_equal(a, b),
            (FlagVariant::AbTest(_), FlagVariant::AbTest(_)) => true,
            _ => false,
        }
    }
}

fn stored_equal<F: StoredValue>(a: &F, b: &F) -> bool {
    a.value_exists() == b.value_exists() && a.effective_value() == b.effective_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::variant::{
        AbTestFlag, BooleanFlag, EnumFlag, IntegerFlag, StringFlag, TagFlag,
    };

    fn tags(values: &[&str]) -> std::collections::BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tag_value_equality_ignores_order() {
        let base = TagFlag::new(["x", "y"]);
        let a = FlagVariant::Tag(base.with_value(tags(&["x", "y"])));
        let b = FlagVariant::Tag(base.with_value(tags(&["y", "x", "y"])));
        assert!(VariantComparer::value_equal(&a, &b));
    }

    #[test]
    fn tag_choice_order_matters_for_schema() {
        let a = FlagVariant::Tag(TagFlag::new(["x", "y"]));
        let b = FlagVariant::Tag(TagFlag::new(["y", "x"]));
        assert!(!VariantComparer::schema_equal(&a, &b));
    }

    #[test]
    fn enum_choice_order_matters_for_schema() {
        let a = FlagVariant::Enum(EnumFlag::new(["A", "B"], "A"));
        let b = FlagVariant::Enum(EnumFlag::new(["B", "A"], "A"));
        assert!(!VariantComparer::schema_equal(&a, &b));
    }

    #[test]
    fn schema_ignores_override() {
        let base = IntegerFlag::new(0, 10, 5);
        let a = FlagVariant::Integer(base.clone());
        let b = FlagVariant::Integer(base.with_value(9));
        assert!(VariantComparer::schema_equal(&a, &b));
        assert!(!VariantComparer::value_equal(&a, &b));
    }

    #[test]
    fn value_exists_is_part_of_value_equality() {
        // Same resolved value, but one is an explicit override.
        let base = StringFlag::new("x");
        let a = FlagVariant::String(base.clone());
        let b = FlagVariant::String(base.with_value("x".into()));
        assert!(!VariantComparer::value_equal(&a, &b));
    }

    #[test]
    fn kill_switch_is_schema() {
        let a = FlagVariant::Boolean(BooleanFlag::new(true));
        let b = FlagVariant::Boolean(BooleanFlag::new(true).kill_switch());
        assert!(!VariantComparer::schema_equal(&a, &b));
        assert!(VariantComparer::value_equal(&a, &b));
    }

    #[test]
    fn ab_test_compares_chance_only() {
        let a = FlagVariant::AbTest(AbTestFlag::new(10.0));
        let b = FlagVariant::AbTest(AbTestFlag::new(20.0));
        assert!(!VariantComparer::schema_equal(&a, &b));
        assert!(VariantComparer::value_equal(&a, &b));
    }

    #[test]
    fn different_kinds_are_never_equal() {
        let a = FlagVariant::Boolean(BooleanFlag::new(true));
        let b = FlagVariant::AbTest(AbTestFlag::new(20.0));
        assert!(!VariantComparer::schema_equal(&a, &b));
        assert!(!VariantComparer::value_equal(&a, &b));
    }
}
