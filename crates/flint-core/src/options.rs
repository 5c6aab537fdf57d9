//! Versioned, nested compile-option sets.
//!
//! One option set describes one build configuration for one toolchain.
//! Values are grouped by category (`global`, `c/cpp-compiler`,
//! `asm-compiler`, `linker`); each category maps option keys to string,
//! switch, or string-list values. Categories use `BTreeMap` so the
//! serialized form is stable and hashable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category for options shared by every tool in the chain.
pub const CATEGORY_GLOBAL: &str = "global";
/// Category for the C/C++ compiler.
pub const CATEGORY_C_CPP: &str = "c/cpp-compiler";
/// Category for the assembler.
pub const CATEGORY_ASM: &str = "asm-compiler";
/// Category for the linker.
pub const CATEGORY_LINKER: &str = "linker";

/// All recognized categories in canonical order.
pub const CATEGORIES: [&str; 4] = [
    CATEGORY_GLOBAL,
    CATEGORY_C_CPP,
    CATEGORY_ASM,
    CATEGORY_LINKER,
];

/// A single option value: switch, string, or string list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// An on/off switch.
    Bool(bool),
    /// A plain string value.
    Text(String),
    /// An ordered list of string values.
    List(Vec<String>),
}

impl OptionValue {
    /// The switch value, if this is a switch.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string value, if this is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The list value, if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        OptionValue::List(v)
    }
}

/// One category's option table.
pub type OptionCategory = BTreeMap<String, OptionValue>;

/// A versioned, nested option set for one toolchain configuration.
///
/// The `version` field strictly increases with each schema migration;
/// on-disk sets with an older version are migrated forward before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOptionSet {
    /// Schema version this set conforms to.
    pub version: u32,
    /// Category name to option table.
    #[serde(flatten)]
    pub categories: BTreeMap<String, OptionCategory>,
}

impl CompileOptionSet {
    /// Create an empty option set at the given schema version.
    pub fn new(version: u32) -> Self {
        CompileOptionSet {
            version,
            categories: BTreeMap::new(),
        }
    }

    /// The option table for a category, if present.
    pub fn category(&self, name: &str) -> Option<&OptionCategory> {
        self.categories.get(name)
    }

    /// The option table for a category, created on demand.
    pub fn category_mut(&mut self, name: &str) -> &mut OptionCategory {
        self.categories.entry(name.to_string()).or_default()
    }

    /// Look up one option value.
    pub fn get(&self, category: &str, key: &str) -> Option<&OptionValue> {
        self.categories.get(category)?.get(key)
    }

    /// Set one option value.
    pub fn set(&mut self, category: &str, key: &str, value: impl Into<OptionValue>) {
        self.category_mut(category)
            .insert(key.to_string(), value.into());
    }

    /// Remove one option value, returning the previous value if any.
    pub fn remove(&mut self, category: &str, key: &str) -> Option<OptionValue> {
        self.categories.get_mut(category)?.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut opts = CompileOptionSet::new(3);
        opts.set(CATEGORY_C_CPP, "optimization", "level-1");
        opts.set(CATEGORY_LINKER, "output-format", "elf");
        opts.set(CATEGORY_GLOBAL, "output-debug-info", true);

        assert_eq!(
            opts.get(CATEGORY_C_CPP, "optimization")
                .and_then(|v| v.as_text()),
            Some("level-1")
        );
        assert_eq!(
            opts.get(CATEGORY_GLOBAL, "output-debug-info")
                .and_then(|v| v.as_bool()),
            Some(true)
        );
        assert!(opts.get(CATEGORY_ASM, "anything").is_none());
    }

    #[test]
    fn remove_value() {
        let mut opts = CompileOptionSet::new(1);
        opts.set(CATEGORY_LINKER, "output-format", "lib");
        assert!(opts.remove(CATEGORY_LINKER, "output-format").is_some());
        assert!(opts.get(CATEGORY_LINKER, "output-format").is_none());
    }

    #[test]
    fn json_round_trip() {
        let mut opts = CompileOptionSet::new(2);
        opts.set(CATEGORY_C_CPP, "misc-controls", "--gnu");
        opts.set(
            CATEGORY_C_CPP,
            "include-dirs",
            vec!["inc".to_string(), "src".to_string()],
        );

        let json = serde_json::to_string(&opts).unwrap();
        let back: CompileOptionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }

    #[test]
    fn version_is_top_level_field() {
        let opts = CompileOptionSet::new(7);
        let json: serde_json::Value = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["version"], 7);
    }

    #[test]
    fn untagged_value_shapes() {
        let json = r#"{"version":1,"linker":{"output-format":"lib","lto":true,"scripts":["a.ld","b.ld"]}}"#;
        let opts: CompileOptionSet = serde_json::from_str(json).unwrap();
        assert_eq!(
            opts.get(CATEGORY_LINKER, "lto").and_then(|v| v.as_bool()),
            Some(true)
        );
        assert_eq!(
            opts.get(CATEGORY_LINKER, "scripts")
                .and_then(|v| v.as_list())
                .map(|l| l.len()),
            Some(2)
        );
    }
}
