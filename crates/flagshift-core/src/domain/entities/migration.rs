//! Migration file and migration plan entities.
//!
//! A [`MigrationFile`] is untrusted input describing the target state of an
//! environment. A [`MigrationSummary`] is the reviewed, ordered plan derived
//! from it. Neither is ever mutated after construction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};

use super::variant::FlagVariant;
use crate::domain::value_objects::{FlagKey, SemVer};

// ── MigrationFile ────────────────────────────────────────────────────────────

/// Declarative target state for one environment.
///
/// `version` and the flag keys are kept raw here; the migration file
/// validator parses them and reports which one is malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationFile {
    pub environment: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub flags: FlagEntries,
}

impl MigrationFile {
    pub fn new(
        environment: impl Into<String>,
        version: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            environment: environment.into(),
            version: version.into(),
            created_at,
            flags: FlagEntries::default(),
        }
    }

    /// Append a flag, keeping file order.
    pub fn with_flag(mut self, key: impl Into<String>, variant: FlagVariant) -> Self {
        self.flags.push(key, variant);
        self
    }
}

/// Flags of a migration file in the order they appear in the document.
///
/// Serialized as a JSON object. Decoding rejects duplicate keys and tags any
/// variant decode error with the offending key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagEntries(Vec<(String, FlagVariant)>);

impl FlagEntries {
    pub fn push(&mut self, key: impl Into<String>, variant: FlagVariant) {
        self.0.push((key.into(), variant));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagVariant)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&FlagVariant> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FlagVariant)> for FlagEntries {
    fn from_iter<T: IntoIterator<Item = (String, FlagVariant)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for FlagEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, variant) in &self.0 {
            map.serialize_entry(key, variant)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FlagEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = FlagEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of flag keys to flag definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(key) = access.next_key::<String>()? {
                    if entries.iter().any(|(k, _)| k == &key) {
                        return Err(de::Error::custom(format!("duplicate flag key '{key}'")));
                    }
                    let variant = access
                        .next_value::<FlagVariant>()
                        .map_err(|e| de::Error::custom(format!("flag '{key}': {e}")))?;
                    entries.push((key, variant));
                }
                Ok(FlagEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// ── MigrationStep ────────────────────────────────────────────────────────────

/// What a step does to the persisted flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepMode {
    /// Create the flag with its default and no override.
    #[serde(rename = "CREATE_DEFAULTVALUE")]
    CreateDefaultValue,
    /// Replace the override value.
    #[serde(rename = "SET_VALUE")]
    SetValue,
    /// Replace constraints and default in place, keeping the override.
    #[serde(rename = "UPDATE_SCHEMA_DEFAULTVALUE")]
    UpdateSchemaDefaultValue,
    /// Remove the flag.
    #[serde(rename = "DELETE")]
    Delete,
}

impl StepMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateDefaultValue => "CREATE_DEFAULTVALUE",
            Self::SetValue => "SET_VALUE",
            Self::UpdateSchemaDefaultValue => "UPDATE_SCHEMA_DEFAULTVALUE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation in a migration plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStep {
    pub id: u32,
    pub mode: StepMode,
    pub flag_key: FlagKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<FlagVariant>,
    /// Id of the earlier step this one is contingent on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_id: Option<u32>,
    /// Display nesting depth. No effect on execution order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<u8>,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.id, self.mode, self.flag_key)?;
        if let Some(dep) = self.dependent_id {
            write!(f, " (after #{dep})")?;
        }
        Ok(())
    }
}

// ── MigrationSummary ─────────────────────────────────────────────────────────

/// An ordered migration plan. `steps` order is the execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub environment: String,
    pub version: SemVer,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<MigrationStep>,
}

impl MigrationSummary {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that touch `key`, in plan order.
    pub fn steps_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MigrationStep> {
        self.steps.iter().filter(move |s| s.flag_key.as_str() == key)
    }

    /// Number of steps per mode, in `StepMode` declaration order.
    pub fn counts(&self) -> [(StepMode, usize); 4] {
        let count = |mode| self.steps.iter().filter(|s| s.mode == mode).count();
        [
            (StepMode::CreateDefaultValue, count(StepMode::CreateDefaultValue)),
            (StepMode::SetValue, count(StepMode::SetValue)),
            (
                StepMode::UpdateSchemaDefaultValue,
                count(StepMode::UpdateSchemaDefaultValue),
            ),
            (StepMode::Delete, count(StepMode::Delete)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::variant::{BooleanFlag, IntegerFlag};

    const FILE: &str = r#"{
        "environment": "production",
        "version": "1.2.0",
        "createdAt": "2026-01-15T10:00:00Z",
        "flags": {
            "zeta/last": { "type": "BOOLEAN", "defaultValue": false },
            "alpha/first": { "type": "INTEGER", "minValue": 0, "maxValue": 9, "defaultValue": 1 }
        }
    }"#;

    #[test]
    fn flags_keep_document_order() {
        let file: MigrationFile = serde_json::from_str(FILE).unwrap();
        let keys: Vec<&str> = file.flags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta/last", "alpha/first"]);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let json = r#"{"a": {"type":"BOOLEAN","defaultValue":true},
                       "a": {"type":"BOOLEAN","defaultValue":false}}"#;
        let err = serde_json::from_str::<FlagEntries>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate flag key 'a'"));
    }

    #[test]
    fn variant_decode_errors_name_the_key() {
        let json = r#"{"a/b": {"type":"INTEGER","minValue":0,"maxValue":9,"defaultValue":1.5}}"#;
        let err = serde_json::from_str::<FlagEntries>(json).unwrap_err();
        assert!(err.to_string().contains("flag 'a/b'"));
    }

    #[test]
    fn step_serializes_wire_names() {
        let step = MigrationStep {
            id: 2,
            mode: StepMode::SetValue,
            flag_key: FlagKey::parse("a/b").unwrap(),
            flag: Some(FlagVariant::Boolean(BooleanFlag::new(true))),
            dependent_id: Some(1),
            indent: Some(1),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["mode"], "SET_VALUE");
        assert_eq!(json["flagKey"], "a/b");
        assert_eq!(json["dependentId"], 1);
        assert_eq!(step.to_string(), "#2 SET_VALUE a/b (after #1)");
    }

    #[test]
    fn file_round_trips_through_builder() {
        let file = MigrationFile::new("dev", "0.1.0", Utc::now())
            .with_flag("x", FlagVariant::Integer(IntegerFlag::new(0, 1, 0)));
        let json = serde_json::to_string(&file).unwrap();
        let back: MigrationFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);
    }
}
