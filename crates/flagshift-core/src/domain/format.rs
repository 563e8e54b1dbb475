//! Human-readable rendering of flag variants.
//!
//! Three views of a variant: a one-line constraint summary, the default
//! value, and the effective value a reader would observe right now.
//!
//! ## AB-TEST resolution
//!
//! An AB-TEST flag stores no value. Reading it draws `r` in `[0, 1)` and
//! yields `"B"` when `r < chanceBPercent / 100`, otherwise `"A"`.
//!
//! - [`Bucketing::Random`] draws a fresh `r` on every read, so two reads of
//!   the same flag may disagree.
//! - [`Bucketing::Sticky`] derives `r` from SHA-256 of `"<key>:<subject>"`,
//!   so a given subject always lands in the same bucket for a given flag.

use std::collections::BTreeSet;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::entities::variant::{FlagVariant, StoredValue};

/// How AB-TEST flags pick a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bucketing<'a> {
    /// Independent draw per read.
    #[default]
    Random,
    /// Deterministic draw per (flag key, subject).
    Sticky { subject: &'a str },
}

/// The value a reader observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveValue {
    pub text: String,
    /// True when no override is stored and the default applies. Always
    /// false for AB-TEST.
    pub is_default_value: bool,
}

/// All three display strings of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDisplay {
    pub schema_text: String,
    pub default_text: String,
    pub effective_value_text: String,
}

pub struct VariantFormatter;

impl VariantFormatter {
    /// Render all three views, resolving AB-TEST with a random draw.
    pub fn format_variant(variant: &FlagVariant) -> VariantDisplay {
        Self::format_variant_with("", variant, Bucketing::Random)
    }

    pub fn format_variant_with(
        key: &str,
        variant: &FlagVariant,
        bucketing: Bucketing<'_>,
    ) -> VariantDisplay {
        VariantDisplay {
            schema_text: Self::schema_text(variant),
            default_text: Self::default_text(variant),
            effective_value_text: Self::effective_value(key, variant, bucketing).text,
        }
    }

    /// One-line constraint summary. Empty when the variant has none.
    pub fn schema_text(variant: &FlagVariant) -> String {
        match variant {
            FlagVariant::Boolean(f) => {
                if f.is_kill_switch {
                    "kill switch".into()
                } else {
                    String::new()
                }
            }
            FlagVariant::Integer(f) => format!("{}...{}", f.min_value, f.max_value),
            FlagVariant::String(f) => {
                let mut parts = Vec::new();
                if f.max_length > 0 {
                    parts.push(format!("max {} chars", f.max_length));
                }
                if let Some(pattern) = &f.reg_exp {
                    parts.push(format!("/{pattern}/"));
                }
                parts.join(", ")
            }
            FlagVariant::Enum(f) => {
                let base = format!("1 from {}", f.enum_values.len());
                if f.allow_empty {
                    format!("{base} (or empty)")
                } else {
                    base
                }
            }
            FlagVariant::Tag(f) => format!(
                "{}...{} from {}",
                f.min_count,
                f.effective_max_count(),
                f.tag_values.len()
            ),
            FlagVariant::AbTest(f) => format!("Chance B: {}%", f.chance_b_percent),
        }
    }

    pub fn default_text(variant: &FlagVariant) -> String {
        match variant {
            FlagVariant::Boolean(f) => f.default_value.to_string(),
            FlagVariant::Integer(f) => f.default_value.to_string(),
            FlagVariant::String(f) => f.default_value.clone(),
            FlagVariant::Enum(f) => choice_text(&f.default_value),
            FlagVariant::Tag(f) => tags_text(&f.default_value),
            FlagVariant::AbTest(_) => "-".into(),
        }
    }

    /// The override if stored, otherwise the default. AB-TEST draws a bucket.
    pub fn effective_value(
        key: &str,
        variant: &FlagVariant,
        bucketing: Bucketing<'_>,
    ) -> EffectiveValue {
        match variant {
            FlagVariant::Boolean(f) => stored(f, |v| v.to_string()),
            FlagVariant::Integer(f) => stored(f, |v| v.to_string()),
            FlagVariant::String(f) => stored(f, Clone::clone),
            FlagVariant::Enum(f) => stored(f, |v| choice_text(v)),
            FlagVariant::Tag(f) => stored(f, tags_text),
            FlagVariant::AbTest(f) => {
                let draw = match bucketing {
                    Bucketing::Random => rand::thread_rng().gen_range(0.0..1.0),
                    Bucketing::Sticky { subject } => sticky_draw(key, subject),
                };
                EffectiveValue {
                    text: ab_bucket(f.chance_b_percent, draw).into(),
                    is_default_value: false,
                }
            }
        }
    }
}

/// `"B"` when `draw` falls under the B share, otherwise `"A"`.
pub fn ab_bucket(chance_b_percent: f64, draw: f64) -> &'static str {
    if draw < chance_b_percent / 100.0 {
        "B"
    } else {
        "A"
    }
}

/// Map `(key, subject)` onto `[0, 1)` using the top 53 bits of a SHA-256.
pub fn sticky_draw(key: &str, subject: &str) -> f64 {
    let digest = Sha256::digest(format!("{key}:{subject}").as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let bits = u64::from_be_bytes(head) >> 11;
    bits as f64 / (1u64 << 53) as f64
}

fn stored<F, R>(flag: &F, render: R) -> EffectiveValue
where
    F: StoredValue,
    R: Fn(&F::Value) -> String,
{
    EffectiveValue {
        text: render(flag.effective_value()),
        is_default_value: !flag.value_exists(),
    }
}

fn choice_text(choice: &str) -> String {
    if choice.is_empty() {
        "(empty)".into()
    } else {
        choice.to_string()
    }
}

fn tags_text(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        "(none)".into()
    } else {
        // BTreeSet iterates sorted, which keeps the output stable.
        tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}
