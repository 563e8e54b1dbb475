//! The flag variant model.
//!
//! A [`FlagVariant`] is one of six closed shapes. Five of them persist an
//! optional override value next to their default; AB-TEST persists only a
//! split percentage and resolves a bucket on every read.
//!
//! ## Wire format
//!
//! ```json
//! { "type": "INTEGER", "minValue": 0, "maxValue": 10, "defaultValue": 5,
//!   "valueExists": true, "value": 7 }
//! ```
//!
//! `value` is present only when `valueExists` is true. The validators in
//! `domain::validation` reject files where the two disagree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::FlagKind;

/// A feature flag definition: constraints, default, and optional override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlagVariant {
    #[serde(rename = "BOOLEAN")]
    Boolean(BooleanFlag),
    #[serde(rename = "INTEGER")]
    Integer(IntegerFlag),
    #[serde(rename = "STRING")]
    String(StringFlag),
    #[serde(rename = "ENUM")]
    Enum(EnumFlag),
    #[serde(rename = "TAG")]
    Tag(TagFlag),
    #[serde(rename = "AB-TEST")]
    AbTest(AbTestFlag),
}

impl FlagVariant {
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Boolean(_) => FlagKind::Boolean,
            Self::Integer(_) => FlagKind::Integer,
            Self::String(_) => FlagKind::String,
            Self::Enum(_) => FlagKind::Enum,
            Self::Tag(_) => FlagKind::Tag,
            Self::AbTest(_) => FlagKind::AbTest,
        }
    }

    /// Whether this variant declares an explicit override value.
    pub fn declares_value(&self) -> bool {
        match self {
            Self::Boolean(f) => f.declares_value(),
            Self::Integer(f) => f.declares_value(),
            Self::String(f) => f.declares_value(),
            Self::Enum(f) => f.declares_value(),
            Self::Tag(f) => f.declares_value(),
            Self::AbTest(_) => false,
        }
    }

    /// The same definition with any override value dropped.
    pub fn without_value(&self) -> Self {
        match self {
            Self::Boolean(f) => Self::Boolean(f.with_stored(false, None)),
            Self::Integer(f) => Self::Integer(f.with_stored(false, None)),
            Self::String(f) => Self::String(f.with_stored(false, None)),
            Self::Enum(f) => Self::Enum(f.with_stored(false, None)),
            Self::Tag(f) => Self::Tag(f.with_stored(false, None)),
            Self::AbTest(f) => Self::AbTest(f.clone()),
        }
    }
}

/// Shared access to the default/override pair of value-bearing kinds.
pub trait StoredValue: Clone {
    type Value: Clone + PartialEq;

    fn default_value(&self) -> &Self::Value;
    fn value_exists(&self) -> bool;
    fn value(&self) -> Option<&Self::Value>;

    /// A copy with the override fields replaced and everything else kept.
    fn with_stored(&self, value_exists: bool, value: Option<Self::Value>) -> Self;

    /// The override when one exists, otherwise the default.
    fn effective_value(&self) -> &Self::Value {
        match self.value() {
            Some(value) if self.value_exists() => value,
            _ => self.default_value(),
        }
    }

    /// Whether the variant carries an override (flag set or value present).
    fn declares_value(&self) -> bool {
        self.value_exists() || self.value().is_some()
    }

    /// Copy with the given override set.
    fn with_value(&self, value: Self::Value) -> Self {
        self.with_stored(true, Some(value))
    }
}

macro_rules! impl_stored_value {
    ($flag:ty, $value:ty) => {
        impl StoredValue for $flag {
            type Value = $value;

            fn default_value(&self) -> &Self::Value {
                &self.default_value
            }

            fn value_exists(&self) -> bool {
                self.value_exists
            }

            fn value(&self) -> Option<&Self::Value> {
                self.value.as_ref()
            }

            fn with_stored(&self, value_exists: bool, value: Option<Self::Value>) -> Self {
                Self {
                    value_exists,
                    value,
                    ..self.clone()
                }
            }
        }
    };
}

// ── BOOLEAN ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanFlag {
    #[serde(default)]
    pub is_kill_switch: bool,
    pub default_value: bool,
    #[serde(default)]
    pub value_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

impl BooleanFlag {
    pub fn new(default_value: bool) -> Self {
        Self {
            is_kill_switch: false,
            default_value,
            value_exists: false,
            value: None,
        }
    }

    pub fn kill_switch(mut self) -> Self {
        self.is_kill_switch = true;
        self
    }
}

impl_stored_value!(BooleanFlag, bool);

// ── INTEGER ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegerFlag {
    pub min_value: i64,
    pub max_value: i64,
    pub default_value: i64,
    #[serde(default)]
    pub value_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl IntegerFlag {
    pub fn new(min_value: i64, max_value: i64, default_value: i64) -> Self {
        Self {
            min_value,
            max_value,
            default_value,
            value_exists: false,
            value: None,
        }
    }
}

impl_stored_value!(IntegerFlag, i64);

// ── STRING ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFlag {
    /// Maximum length in characters; 0 means unbounded.
    #[serde(default)]
    pub max_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_exp: Option<String>,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub value_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl StringFlag {
    pub fn new(default_value: impl Into<String>) -> Self {
        Self {
            max_length: 0,
            reg_exp: None,
            default_value: default_value.into(),
            value_exists: false,
            value: None,
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn reg_exp(mut self, pattern: impl Into<String>) -> Self {
        self.reg_exp = Some(pattern.into());
        self
    }
}

impl_stored_value!(StringFlag, String);

// ── ENUM ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumFlag {
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub allow_empty: bool,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub value_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EnumFlag {
    pub fn new<I, S>(enum_values: I, default_value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: enum_values.into_iter().map(Into::into).collect(),
            allow_empty: false,
            default_value: default_value.into(),
            value_exists: false,
            value: None,
        }
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }
}

impl_stored_value!(EnumFlag, String);

// ── TAG ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFlag {
    pub tag_values: Vec<String>,
    #[serde(default)]
    pub min_count: usize,
    /// 0 means "as many as there are tag values".
    #[serde(default)]
    pub max_count: usize,
    #[serde(default)]
    pub default_value: BTreeSet<String>,
    #[serde(default)]
    pub value_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BTreeSet<String>>,
}

impl TagFlag {
    pub fn new<I, S>(tag_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag_values: tag_values.into_iter().map(Into::into).collect(),
            min_count: 0,
            max_count: 0,
            default_value: BTreeSet::new(),
            value_exists: false,
            value: None,
        }
    }

    pub fn counts(mut self, min_count: usize, max_count: usize) -> Self {
        self.min_count = min_count;
        self.max_count = max_count;
        self
    }

    pub fn defaults<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_value = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Upper bound on selected tags with the 0 sentinel resolved.
    pub fn effective_max_count(&self) -> usize {
        if self.max_count == 0 {
            self.tag_values.len()
        } else {
            self.max_count
        }
    }
}

impl_stored_value!(TagFlag, BTreeSet<String>);

// ── AB-TEST ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestFlag {
    /// Probability, in percent, of resolving to bucket B.
    pub chance_b_percent: f64,
}

impl AbTestFlag {
    pub fn new(chance_b_percent: f64) -> Self {
        Self { chance_b_percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_value_falls_back_to_default() {
        let flag = IntegerFlag::new(0, 10, 5);
        assert_eq!(*flag.effective_value(), 5);
        assert_eq!(*flag.with_value(7).effective_value(), 7);
    }

    #[test]
    fn value_without_exists_flag_is_ignored_for_resolution() {
        let flag = IntegerFlag {
            value: Some(9),
            ..IntegerFlag::new(0, 10, 5)
        };
        assert_eq!(*flag.effective_value(), 5);
        assert!(flag.declares_value());
    }

    #[test]
    fn without_value_clears_override() {
        let flag = FlagVariant::String(StringFlag::new("x").with_value("y".into()));
        assert!(flag.declares_value());
        let cleared = flag.without_value();
        assert!(!cleared.declares_value());
        assert_eq!(cleared.kind(), FlagKind::String);
    }

    #[test]
    fn ab_test_never_declares_value() {
        assert!(!FlagVariant::AbTest(AbTestFlag::new(50.0)).declares_value());
    }

    #[test]
    fn tag_max_count_zero_means_all() {
        let flag = TagFlag::new(["a", "b", "c"]);
        assert_eq!(flag.effective_max_count(), 3);
        assert_eq!(flag.counts(1, 2).effective_max_count(), 2);
    }

    #[test]
    fn decodes_tagged_json() {
        let json = r#"{"type":"TAG","tagValues":["x","y","z"],"minCount":1,
            "defaultValue":["y","x","x"],"valueExists":true,"value":["z"]}"#;
        let flag: FlagVariant = serde_json::from_str(json).unwrap();
        let FlagVariant::Tag(tag) = flag else {
            panic!("expected TAG");
        };
        assert_eq!(tag.default_value.len(), 2);
        assert_eq!(tag.max_count, 0);
        assert!(tag.value_exists);
    }

    #[test]
    fn encodes_ab_test_with_dash_tag() {
        let json = serde_json::to_value(FlagVariant::AbTest(AbTestFlag::new(25.0))).unwrap();
        assert_eq!(json["type"], "AB-TEST");
        assert_eq!(json["chanceBPercent"], 25.0);
    }

    #[test]
    fn omits_absent_value_when_encoding() {
        let json = serde_json::to_value(FlagVariant::Boolean(BooleanFlag::new(true))).unwrap();
        assert!(json.get("value").is_none());
        assert_eq!(json["isKillSwitch"], false);
        assert_eq!(json["valueExists"], false);
    }
}
