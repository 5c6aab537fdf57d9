//! `flint.toml` manifest parsing and project configuration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use flint_core::memory::{canonical_hex, MemoryLayout};
use flint_core::project::{
    normalize_group_name, DeviceInfo, FileGroup, FloatPolicy, PatternOption, Project, ProjectKind,
    SourceFile,
};

/// Manifest file name.
pub const MANIFEST_FILE_NAME: &str = "flint.toml";

/// The top-level manifest structure for a flint project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlintManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Target device identity.
    pub device: DeviceInfo,
    /// Ordered file groups.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    /// Ordered per-file extra-option patterns.
    #[serde(default)]
    pub file_options: Vec<PatternOption>,
    /// Fixed-slot memory table (ARM projects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,
    /// Environment variable overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Project family.
    pub kind: ProjectKind,
    /// Active toolchain name.
    pub toolchain: String,
    /// Floating-point policy (ARM targets).
    #[serde(default)]
    pub float_policy: FloatPolicy,
    /// Output directory.
    #[serde(default = "default_output")]
    pub output: String,
    /// Include directories.
    #[serde(default)]
    pub include_dirs: Vec<String>,
    /// Library directories.
    #[serde(default)]
    pub library_dirs: Vec<String>,
    /// Macro definitions.
    #[serde(default)]
    pub defines: Vec<String>,
}

fn default_output() -> String {
    "build".to_string()
}

/// One file group in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupConfig {
    /// Group name.
    pub name: String,
    /// Whether the group participates in the build.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the group is a virtual folder.
    #[serde(default)]
    pub is_virtual: bool,
    /// File entries.
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

fn default_true() -> bool {
    true
}

/// A file entry: plain path or detailed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    /// Enabled file given by its path.
    Path(String),
    /// Detailed entry with flags.
    #[serde(rename_all = "kebab-case")]
    Detailed {
        /// Project-root-relative path.
        path: String,
        /// Whether the file participates in the build.
        #[serde(default = "default_true")]
        enabled: bool,
        /// Display path inside a virtual folder.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        virtual_path: Option<String>,
    },
}

/// The manifest form of the fixed memory table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryConfig {
    /// ROM-family slot entries.
    #[serde(default)]
    pub rom: Vec<SlotConfig>,
    /// RAM-family slot entries.
    #[serde(default)]
    pub ram: Vec<SlotConfig>,
}

/// One configured memory slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlotConfig {
    /// 1-based table index (1..=5).
    pub slot: u32,
    /// Start address (hex or decimal).
    pub start: String,
    /// Size in bytes (hex or decimal).
    pub size: String,
    /// ROM slots: holds the reset/entry vector.
    #[serde(default)]
    pub startup: bool,
    /// RAM slots: skip zero-initialization.
    #[serde(default)]
    pub no_init: bool,
}

impl FlintManifest {
    /// Load a manifest from a project directory.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MANIFEST_FILE_NAME);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let manifest: FlintManifest =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(manifest)
    }

    /// Write a manifest into a project directory.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let path = project_dir.join(MANIFEST_FILE_NAME);
        let text = toml::to_string_pretty(self).context("serializing manifest")?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Convert to the abstract project model.
    pub fn to_project(&self) -> Result<Project> {
        let memory = match &self.memory {
            Some(config) => Some(build_memory(config)?),
            None => None,
        };
        Ok(Project {
            name: self.project.name.clone(),
            kind: self.project.kind,
            toolchain: self.project.toolchain.clone(),
            device: self.device.clone(),
            float_policy: self.project.float_policy,
            groups: self
                .groups
                .iter()
                .map(|g| FileGroup {
                    name: normalize_group_name(&g.name),
                    enabled: g.enabled,
                    is_virtual: g.is_virtual,
                    files: g.files.iter().map(FileSpec::to_source_file).collect(),
                })
                .collect(),
            include_dirs: self.project.include_dirs.clone(),
            library_dirs: self.project.library_dirs.clone(),
            defines: self.project.defines.clone(),
            file_options: self.file_options.clone(),
            memory,
            env: self.env.clone(),
            output_dir: self.project.output.clone(),
            rte_deps: Vec::new(),
        })
    }

    /// Build a manifest from an abstract project (used by the importer).
    pub fn from_project(project: &Project) -> Self {
        FlintManifest {
            project: ProjectConfig {
                name: project.name.clone(),
                kind: project.kind,
                toolchain: project.toolchain.clone(),
                float_policy: project.float_policy,
                output: project.output_dir.clone(),
                include_dirs: project.include_dirs.clone(),
                library_dirs: project.library_dirs.clone(),
                defines: project.defines.clone(),
            },
            device: project.device.clone(),
            groups: project
                .groups
                .iter()
                .map(|g| GroupConfig {
                    name: g.name.clone(),
                    enabled: g.enabled,
                    is_virtual: g.is_virtual,
                    files: g
                        .files
                        .iter()
                        .map(|f| {
                            if f.enabled && f.virtual_path.is_none() {
                                FileSpec::Path(f.path.clone())
                            } else {
                                FileSpec::Detailed {
                                    path: f.path.clone(),
                                    enabled: f.enabled,
                                    virtual_path: f.virtual_path.clone(),
                                }
                            }
                        })
                        .collect(),
                })
                .collect(),
            file_options: project.file_options.clone(),
            memory: project.memory.as_ref().map(memory_to_config),
            env: project.env.clone(),
        }
    }
}

impl FileSpec {
    fn to_source_file(&self) -> SourceFile {
        match self {
            FileSpec::Path(path) => SourceFile::new(path.clone()),
            FileSpec::Detailed {
                path,
                enabled,
                virtual_path,
            } => SourceFile {
                path: path.clone(),
                enabled: *enabled,
                virtual_path: virtual_path.clone(),
            },
        }
    }
}

fn build_memory(config: &MemoryConfig) -> Result<MemoryLayout> {
    let mut layout = MemoryLayout::empty();
    for entry in &config.rom {
        let slot = match layout.rom_slot_mut(entry.slot) {
            Ok(slot) => slot,
            Err(e) => bail!("memory.rom: {e}"),
        };
        slot.start = canonical_hex(&entry.start).with_context(|| format!("rom slot {}", entry.slot))?;
        slot.size = canonical_hex(&entry.size).with_context(|| format!("rom slot {}", entry.slot))?;
        slot.selected = true;
        slot.is_startup = entry.startup;
    }
    for entry in &config.ram {
        let slot = match layout.ram_slot_mut(entry.slot) {
            Ok(slot) => slot,
            Err(e) => bail!("memory.ram: {e}"),
        };
        slot.start = canonical_hex(&entry.start).with_context(|| format!("ram slot {}", entry.slot))?;
        slot.size = canonical_hex(&entry.size).with_context(|| format!("ram slot {}", entry.slot))?;
        slot.selected = true;
        slot.no_init = entry.no_init;
    }
    Ok(layout)
}

fn memory_to_config(layout: &MemoryLayout) -> MemoryConfig {
    MemoryConfig {
        rom: layout
            .selected_roms()
            .map(|r| SlotConfig {
                slot: slot_table_index(r),
                start: r.start.clone(),
                size: r.size.clone(),
                startup: r.is_startup,
                no_init: false,
            })
            .collect(),
        ram: layout
            .selected_rams()
            .map(|r| SlotConfig {
                slot: slot_table_index(r),
                start: r.start.clone(),
                size: r.size.clone(),
                startup: false,
                no_init: r.no_init,
            })
            .collect(),
    }
}

/// Back from per-tag slot ids to 1..=5 table indexes (on-chip tags start
/// at table index 4).
fn slot_table_index(region: &flint_core::memory::MemoryRegion) -> u32 {
    use flint_core::memory::MemoryTag;
    match region.tag {
        MemoryTag::Rom | MemoryTag::Ram => region.slot,
        MemoryTag::Irom | MemoryTag::Iram => region.slot + 3,
    }
}
