//! Domain value objects: FlagKey, FlagKind, SemVer.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. Each
//! owns its grammar: a `FlagKey` or `SemVer` that exists has already been
//! checked, so downstream code never re-validates them.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── FlagKey ──────────────────────────────────────────────────────────────────

/// A hierarchical flag key such as `checkout/payment/new-flow`.
///
/// One or more segments joined by `/`. Each segment is non-empty and made of
/// ASCII letters, digits, `_` or `-`. No leading or trailing slash.
///
/// Invariant: only constructed through [`FlagKey::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlagKey(String);

impl FlagKey {
    /// Parse and validate a raw key.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        match Self::grammar_violation(&raw) {
            Some(reason) => Err(DomainError::InvalidFlagKey { key: raw, reason }),
            None => Ok(Self(raw)),
        }
    }

    /// Whether `raw` satisfies the key grammar.
    pub fn is_valid(raw: &str) -> bool {
        Self::grammar_violation(raw).is_none()
    }

    fn grammar_violation(raw: &str) -> Option<String> {
        if raw.is_empty() {
            return Some("key cannot be empty".into());
        }
        if raw.starts_with('/') || raw.ends_with('/') {
            return Some("key cannot start or end with '/'".into());
        }
        for (index, segment) in raw.split('/').enumerate() {
            if segment.is_empty() {
                return Some(format!("segment {} is empty", index + 1));
            }
            if let Some(bad) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            {
                return Some(format!(
                    "segment '{segment}' contains invalid character '{bad}'"
                ));
            }
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Nesting depth (`a` is 1, `a/b` is 2).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FlagKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FlagKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FlagKey> for String {
    fn from(key: FlagKey) -> Self {
        key.0
    }
}

impl AsRef<str> for FlagKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── FlagKind ─────────────────────────────────────────────────────────────────

/// The discriminator of a [`FlagVariant`](crate::domain::FlagVariant).
///
/// The set is closed. Every consumer matches on it exhaustively, so adding a
/// kind is a compile error everywhere it needs handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagKind {
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "INTEGER")]
    Integer,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "ENUM")]
    Enum,
    #[serde(rename = "TAG")]
    Tag,
    #[serde(rename = "AB-TEST")]
    AbTest,
}

impl FlagKind {
    pub const ALL: [FlagKind; 6] = [
        Self::Boolean,
        Self::Integer,
        Self::String,
        Self::Enum,
        Self::Tag,
        Self::AbTest,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::String => "STRING",
            Self::Enum => "ENUM",
            Self::Tag => "TAG",
            Self::AbTest => "AB-TEST",
        }
    }

    /// Whether flags of this kind persist an override value.
    pub const fn stores_value(&self) -> bool {
        !matches!(self, Self::AbTest)
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "INTEGER" | "INT" => Ok(Self::Integer),
            "STRING" | "STR" => Ok(Self::String),
            "ENUM" => Ok(Self::Enum),
            "TAG" | "TAGS" => Ok(Self::Tag),
            "AB-TEST" | "ABTEST" | "AB" => Ok(Self::AbTest),
            other => Err(DomainError::UnknownFlagKind(other.to_string())),
        }
    }
}

// ── SemVer ───────────────────────────────────────────────────────────────────

/// A `MAJOR.MINOR.PATCH` version. Pre-release and build suffixes are not
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The next patch version.
    pub const fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl Default for SemVer {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DomainError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("each component must be a non-negative integer"));
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(invalid("components cannot have leading zeros"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("component is out of range"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl TryFrom<String> for SemVer {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SemVer> for String {
    fn from(version: SemVer) -> Self {
        version.to_string()
    }
}
