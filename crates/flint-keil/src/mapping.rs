//! Declarative option-field mapping for the ARM family.
//!
//! A per-toolchain-variant JSON resource describes, for every abstract
//! option key, which legacy nested field holds it and how values
//! translate. `to_legacy`/`from_legacy` are symmetric lookups through
//! this table; only the two hand-coded C51 fields live outside it.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Deserialize;

use flint_core::options::OptionValue;
use flint_toolchain::descriptor::ToolchainId;

use crate::error::{KeilError, Result};

/// How a rule's values translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Abstract enum value to legacy raw code.
    Enum,
    /// Abstract switch to legacy `1`/`0`.
    Bool,
    /// Verbatim string.
    Text,
}

/// One abstract option key's translation rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRule {
    /// Legacy element path below the family option element.
    pub position: Vec<String>,
    /// Value translation kind.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Abstract value to legacy raw value (enum rules).
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    /// Abstract fallback when a legacy raw value has no reverse entry.
    #[serde(default)]
    pub default: Option<String>,
    /// Abstract value equivalent to "off", tried after `default`.
    #[serde(default)]
    pub false_key: Option<String>,
}

/// The full mapping for one toolchain variant: category name to
/// option-key rules.
#[derive(Debug, Deserialize)]
pub struct FieldMapping {
    /// Per-category rule tables.
    pub groups: BTreeMap<String, BTreeMap<String, FieldRule>>,
}

impl FieldMapping {
    /// Iterate every (category, key, rule) triple.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str, &FieldRule)> {
        self.groups.iter().flat_map(|(category, keys)| {
            keys.iter()
                .map(move |(key, rule)| (category.as_str(), key.as_str(), rule))
        })
    }

    /// Translate an abstract value to its legacy raw form.
    pub fn to_legacy(&self, rule: &FieldRule, value: &OptionValue) -> Option<String> {
        match rule.kind {
            RuleKind::Bool => Some(if value.as_bool()? { "1" } else { "0" }.to_string()),
            RuleKind::Text => Some(value.as_text()?.to_string()),
            RuleKind::Enum => rule.values.get(value.as_text()?).cloned(),
        }
    }

    /// Translate a legacy raw value back to the abstract form.
    ///
    /// Enum rules fall back to the declared default key, then the
    /// false-equivalent key, else `None`.
    pub fn from_legacy(&self, rule: &FieldRule, raw: &str) -> Option<OptionValue> {
        match rule.kind {
            RuleKind::Bool => match raw {
                "1" => Some(OptionValue::Bool(true)),
                "0" => Some(OptionValue::Bool(false)),
                _ => None,
            },
            RuleKind::Text => Some(OptionValue::Text(raw.to_string())),
            RuleKind::Enum => {
                let reversed = rule
                    .values
                    .iter()
                    .find(|(_, legacy)| legacy.as_str() == raw)
                    .map(|(abstract_key, _)| abstract_key.clone());
                reversed
                    .or_else(|| rule.default.clone())
                    .or_else(|| rule.false_key.clone())
                    .map(OptionValue::Text)
            }
        }
    }
}

fn parse(raw: &str) -> FieldMapping {
    serde_json::from_str(raw).expect("embedded field-mapping resource should be valid JSON")
}

/// The field mapping for an ARM-family toolchain variant, parsed once
/// per process.
pub fn mapping_for(id: ToolchainId) -> Result<&'static FieldMapping> {
    match id {
        ToolchainId::Ac5 => {
            static AC5: OnceLock<FieldMapping> = OnceLock::new();
            Ok(AC5.get_or_init(|| parse(include_str!("../resources/ac5.mapping.json"))))
        }
        ToolchainId::Ac6 => {
            static AC6: OnceLock<FieldMapping> = OnceLock::new();
            Ok(AC6.get_or_init(|| parse(include_str!("../resources/ac6.mapping.json"))))
        }
        other => Err(KeilError::Mapping {
            detail: format!("no field mapping for toolchain {}", other.name()),
        }),
    }
}
