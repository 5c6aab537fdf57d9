//! Forward migration of on-disk option files.
//!
//! When a toolchain's option schema version increases, stored option
//! files are migrated: compatibility shims rewrite obsolete shapes, keys
//! the current schema no longer recognizes are dropped, and keys the user
//! never set are back-filled from the toolchain defaults. The stored
//! `version` field strictly increases with each migration; a file already
//! at the current version is returned unchanged.

use std::path::Path;

use serde_json::Value;

use flint_core::options::{CompileOptionSet, OptionValue, CATEGORIES, CATEGORY_C_CPP, CATEGORY_LINKER};

use crate::descriptor::{ToolchainDescriptor, ToolchainId};
use crate::error::{Result, ToolchainError};

/// Migrate a parsed option document to the descriptor's current schema.
pub fn migrate(raw: &Value, descriptor: &ToolchainDescriptor) -> Result<CompileOptionSet> {
    let stored_version = raw
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    if stored_version >= descriptor.version {
        // Already current; parse as-is so repeated migration is a no-op.
        let set: CompileOptionSet = serde_json::from_value(raw.clone())?;
        return Ok(set);
    }

    let mut result = descriptor.default_options();
    let shimmed = apply_shims(raw, descriptor.id);

    let table = descriptor.property_table();
    for category in CATEGORIES {
        let Some(entries) = shimmed.get(category).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in entries {
            // Unknown keys for a category are dropped on migration.
            if !table.allows(category, key) {
                continue;
            }
            if let Some(value) = convert_value(value) {
                result.set(category, key, value);
            }
        }
    }

    result.version = descriptor.version;
    Ok(result)
}

/// Migrate an option file in place.
///
/// Returns the migrated set and rewrites the file only when the stored
/// version was behind. A malformed file is reported as
/// [`ToolchainError::MigrationFailure`] with the original left untouched;
/// callers recover by using in-memory defaults for the session.
pub fn migrate_file(path: &Path, descriptor: &ToolchainDescriptor) -> Result<CompileOptionSet> {
    let text = std::fs::read_to_string(path).map_err(|e| ToolchainError::MigrationFailure {
        path: path.to_path_buf(),
        detail: format!("read: {e}"),
    })?;
    let raw: Value = serde_json::from_str(&text).map_err(|e| ToolchainError::MigrationFailure {
        path: path.to_path_buf(),
        detail: format!("parse: {e}"),
    })?;

    let stored_version = raw.get("version").and_then(Value::as_u64).unwrap_or(0) as u32;
    let migrated = migrate(&raw, descriptor).map_err(|e| ToolchainError::MigrationFailure {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if stored_version < descriptor.version {
        let text = serde_json::to_string_pretty(&migrated)?;
        std::fs::write(path, text)?;
    }
    Ok(migrated)
}

/// Rewrite obsolete option shapes into their current equivalents.
fn apply_shims(raw: &Value, id: ToolchainId) -> Value {
    let mut doc = raw.clone();

    // A flat disable-warnings number array collapses to a comma-joined
    // string.
    if let Some(numbers) = doc
        .get(CATEGORY_C_CPP)
        .and_then(|c| c.get("disable-warnings"))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(n.to_string()),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
    {
        doc[CATEGORY_C_CPP]["disable-warnings"] = Value::String(numbers.join(","));
    }

    // The obsolete output-lib switch became linker.output-format = "lib".
    if doc
        .get(CATEGORY_LINKER)
        .and_then(|c| c.get("output-lib"))
        .and_then(Value::as_bool)
        == Some(true)
    {
        doc[CATEGORY_LINKER]["output-format"] = Value::String("lib".to_string());
    }

    // AC5 one-off: the retired gnu-extensions switch folds into the
    // generic misc-controls flags string.
    if id == ToolchainId::Ac5
        && doc
            .get(CATEGORY_C_CPP)
            .and_then(|c| c.get("gnu-extensions"))
            .and_then(Value::as_bool)
            == Some(true)
    {
        let existing = doc
            .get(CATEGORY_C_CPP)
            .and_then(|c| c.get("misc-controls"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let merged = if existing.is_empty() {
            "--gnu".to_string()
        } else {
            format!("{existing} --gnu")
        };
        doc[CATEGORY_C_CPP]["misc-controls"] = Value::String(merged);
    }

    doc
}

/// Convert a raw JSON value to an option value, `None` for shapes the
/// model cannot carry.
fn convert_value(value: &Value) -> Option<OptionValue> {
    match value {
        Value::Bool(b) => Some(OptionValue::Bool(*b)),
        Value::String(s) => Some(OptionValue::Text(s.clone())),
        Value::Number(n) => Some(OptionValue::Text(n.to_string())),
        Value::Array(items) => {
            let strings: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            (strings.len() == items.len()).then_some(OptionValue::List(strings))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::options::CATEGORY_GLOBAL;
    use serde_json::json;

    fn ac5() -> ToolchainDescriptor {
        ToolchainDescriptor::new(ToolchainId::Ac5)
    }

    #[test]
    fn current_version_returns_unchanged() {
        let descriptor = ac5();
        let mut set = descriptor.default_options();
        set.set(CATEGORY_C_CPP, "optimization", "level-2");
        let raw = serde_json::to_value(&set).unwrap();

        let out = migrate(&raw, &descriptor).unwrap();
        assert_eq!(out, set);
    }

    #[test]
    fn migration_is_idempotent() {
        let descriptor = ac5();
        let raw = json!({
            "version": 1,
            "c/cpp-compiler": { "optimization": "level-1" }
        });
        let once = migrate(&raw, &descriptor).unwrap();
        let twice = migrate(&serde_json::to_value(&once).unwrap(), &descriptor).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.version, descriptor.version);
    }

    #[test]
    fn disable_warnings_array_collapses_to_string() {
        let descriptor = ac5();
        let raw = json!({
            "version": 2,
            "c/cpp-compiler": { "disable-warnings": [550, 1295] }
        });
        let out = migrate(&raw, &descriptor).unwrap();
        assert_eq!(
            out.get(CATEGORY_C_CPP, "disable-warnings")
                .and_then(|v| v.as_text()),
            Some("550,1295")
        );
    }

    #[test]
    fn output_lib_switch_becomes_output_format() {
        let descriptor = ac5();
        let raw = json!({
            "version": 2,
            "linker": { "output-lib": true }
        });
        let out = migrate(&raw, &descriptor).unwrap();
        assert_eq!(
            out.get(CATEGORY_LINKER, "output-format")
                .and_then(|v| v.as_text()),
            Some("lib")
        );
        // The obsolete key itself is dropped.
        assert!(out.get(CATEGORY_LINKER, "output-lib").is_none());
    }

    #[test]
    fn gnu_extensions_fold_into_misc_controls() {
        let descriptor = ac5();
        let raw = json!({
            "version": 3,
            "c/cpp-compiler": {
                "gnu-extensions": true,
                "misc-controls": "--no_rtti"
            }
        });
        let out = migrate(&raw, &descriptor).unwrap();
        assert_eq!(
            out.get(CATEGORY_C_CPP, "misc-controls")
                .and_then(|v| v.as_text()),
            Some("--no_rtti --gnu")
        );
        assert!(out.get(CATEGORY_C_CPP, "gnu-extensions").is_none());
    }

    #[test]
    fn unknown_keys_dropped_and_defaults_back_filled() {
        let descriptor = ac5();
        let raw = json!({
            "version": 1,
            "global": { "totally-unknown": "x" },
            "c/cpp-compiler": { "optimization": "level-3" }
        });
        let out = migrate(&raw, &descriptor).unwrap();
        assert!(out.get(CATEGORY_GLOBAL, "totally-unknown").is_none());
        // User override survives.
        assert_eq!(
            out.get(CATEGORY_C_CPP, "optimization")
                .and_then(|v| v.as_text()),
            Some("level-3")
        );
        // Gap filled from the defaults.
        assert_eq!(
            out.get(CATEGORY_C_CPP, "language-c").and_then(|v| v.as_text()),
            Some("c99")
        );
    }

    #[test]
    fn migrate_file_rewrites_old_versions_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.ac5.options.json");
        std::fs::write(
            &path,
            r#"{"version":1,"c/cpp-compiler":{"optimization":"level-1"}}"#,
        )
        .unwrap();

        let descriptor = ac5();
        let out = migrate_file(&path, &descriptor).unwrap();
        assert_eq!(out.version, descriptor.version);

        // The rewritten file now carries the current version.
        let text = std::fs::read_to_string(&path).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed["version"], descriptor.version);

        // A second migration leaves the file byte-identical.
        let before = std::fs::read_to_string(&path).unwrap();
        migrate_file(&path, &descriptor).unwrap();
        assert_eq!(before, std::fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn malformed_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.ac5.options.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = migrate_file(&path, &ac5()).unwrap_err();
        assert!(matches!(err, ToolchainError::MigrationFailure { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }
}
