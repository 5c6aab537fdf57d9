//! Toolchain-agnostic project description.
//!
//! The abstract model every front end (manifest loader, legacy importer)
//! produces and every back end (build parameter compiler, legacy exporter)
//! consumes: file groups with enable flags, include/define aggregation,
//! per-file option patterns, and the ARM memory table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::memory::MemoryLayout;

/// Project family, deciding the toolchain allow-list and target shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    /// 32-bit ARM Cortex-M targets.
    Arm,
    /// 8051-family targets.
    C51,
    /// RISC-V targets.
    RiscV,
}

/// Hardware floating-point policy for ARM targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloatPolicy {
    /// Software floating point only.
    None,
    /// Single-precision hardware FPU.
    Single,
    /// Double-precision hardware FPU.
    Double,
}

impl Default for FloatPolicy {
    fn default() -> Self {
        FloatPolicy::None
    }
}

/// Target device identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceInfo {
    /// Device name (e.g. "STM32F103C8").
    pub name: String,
    /// Silicon vendor.
    pub vendor: String,
    /// CPU core name (e.g. "cortex-m3"), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<String>,
    /// Device pack description path, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<String>,
}

/// One source file inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceFile {
    /// Project-root-relative path.
    pub path: String,
    /// Whether the file participates in the build.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Display path inside a virtual folder, used for option matching.
    #[serde(default)]
    pub virtual_path: Option<String>,
}

impl SourceFile {
    /// A plain enabled file entry.
    pub fn new(path: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            enabled: true,
            virtual_path: None,
        }
    }

    /// The path used for per-file option pattern matching.
    pub fn match_path(&self) -> &str {
        self.virtual_path.as_deref().unwrap_or(&self.path)
    }
}

/// An ordered group of source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileGroup {
    /// Group name, normalized (forward slashes, no leading separator).
    pub name: String,
    /// Whether the whole group participates in the build.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the group is a virtual folder rather than a directory.
    #[serde(default)]
    pub is_virtual: bool,
    /// Ordered file entries.
    pub files: Vec<SourceFile>,
}

fn default_true() -> bool {
    true
}

/// An externally-sourced component reference from the legacy format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RteDependency {
    /// Component class (e.g. "CMSIS").
    pub class: String,
    /// Component category (e.g. "CORE").
    pub category: String,
    /// Source package path.
    pub package_path: String,
    /// Instantiated file paths inside the project.
    pub instance_paths: Vec<String>,
}

/// One entry of the per-file extra-option pattern table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PatternOption {
    /// Glob pattern matched against the file's virtual-or-real path.
    pub pattern: String,
    /// Extra compiler flags appended for matching files.
    pub flags: String,
}

/// The full abstract project description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Project {
    /// Project name; also names build artifacts.
    pub name: String,
    /// Project family.
    pub kind: ProjectKind,
    /// Active toolchain name (resolved through the registry).
    pub toolchain: String,
    /// Target device.
    pub device: DeviceInfo,
    /// Floating-point policy (ARM targets).
    #[serde(default)]
    pub float_policy: FloatPolicy,
    /// Ordered file groups.
    pub groups: Vec<FileGroup>,
    /// Project include directories.
    #[serde(default)]
    pub include_dirs: Vec<String>,
    /// Project library directories.
    #[serde(default)]
    pub library_dirs: Vec<String>,
    /// Project macro definitions (`NAME` or `NAME=VALUE`).
    #[serde(default)]
    pub defines: Vec<String>,
    /// Ordered per-file extra-option pattern table.
    #[serde(default)]
    pub file_options: Vec<PatternOption>,
    /// Fixed-slot memory table (ARM projects).
    #[serde(default)]
    pub memory: Option<MemoryLayout>,
    /// Environment variable overrides for the build.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Output directory, project-root-relative.
    pub output_dir: String,
    /// External component references imported from legacy projects.
    #[serde(default)]
    pub rte_deps: Vec<RteDependency>,
}

/// Classification of a source file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// C source.
    C,
    /// C++ source.
    Cpp,
    /// Assembly source.
    Asm,
    /// Pre-built object file.
    Object,
    /// Static library.
    Lib,
}

/// Classify a path by its extension, `None` for non-source files.
pub fn source_kind(path: &str) -> Option<SourceKind> {
    let ext = path.rsplit('.').next()?;
    match ext.to_ascii_lowercase().as_str() {
        "c" => Some(SourceKind::C),
        "cpp" | "cxx" | "cc" | "c++" => Some(SourceKind::Cpp),
        "s" | "asm" | "a51" => Some(SourceKind::Asm),
        "o" | "obj" => Some(SourceKind::Object),
        "a" | "lib" => Some(SourceKind::Lib),
        _ => None,
    }
}

/// Normalize a group name: canonicalize separators to `/` and strip any
/// leading separator run.
pub fn normalize_group_name(name: &str) -> String {
    let forward = name.replace('\\', "/");
    forward.trim_start_matches('/').to_string()
}

/// De-duplicate a string list preserving first-seen order.
pub fn dedup_first_seen(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_allow_list() {
        assert_eq!(source_kind("src/main.c"), Some(SourceKind::C));
        assert_eq!(source_kind("lib/util.CPP"), Some(SourceKind::Cpp));
        assert_eq!(source_kind("startup.S"), Some(SourceKind::Asm));
        assert_eq!(source_kind("boot.a51"), Some(SourceKind::Asm));
        assert_eq!(source_kind("vendor/core.lib"), Some(SourceKind::Lib));
        assert_eq!(source_kind("readme.md"), None);
        assert_eq!(source_kind("Makefile"), None);
    }

    #[test]
    fn group_name_normalization() {
        assert_eq!(normalize_group_name("\\drivers\\uart"), "drivers/uart");
        assert_eq!(normalize_group_name("//src"), "src");
        assert_eq!(normalize_group_name("app"), "app");
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let items = vec![
            "inc".to_string(),
            "src".to_string(),
            "inc".to_string(),
            "vendor".to_string(),
        ];
        assert_eq!(dedup_first_seen(items), ["inc", "src", "vendor"]);
    }

    #[test]
    fn match_path_prefers_virtual() {
        let mut file = SourceFile::new("lib/deep/uart.c");
        assert_eq!(file.match_path(), "lib/deep/uart.c");
        file.virtual_path = Some("drivers/uart.c".to_string());
        assert_eq!(file.match_path(), "drivers/uart.c");
    }
}
