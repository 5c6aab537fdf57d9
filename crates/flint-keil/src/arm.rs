//! Family B: ARM (`.uvprojx`) project translation.
//!
//! Option translation is table-driven through the per-variant field
//! mapping; the memory table maps onto the ten `OCR_RVCT` slots plus
//! their checkbox fields. Repeated nodes (`Group`, `File`, `component`,
//! RTE `file`) are collected into ordered lists.

use std::path::Path;

use flint_core::memory::{canonical_hex, MemoryLayout};
use flint_core::options::CompileOptionSet;
use flint_core::project::{Project, ProjectKind, RteDependency};
use flint_toolchain::defaults;
use flint_toolchain::descriptor::ToolchainId;

use crate::document::{find_element, XmlDocument};
use crate::error::{KeilError, Result};
use crate::mapping;
use crate::model::{self, KeilProjectModel};

const ADS_BASE: [&str; 4] = ["Targets", "Target", "TargetOption", "TargetArmAds"];
const MISC_BASE: [&str; 5] = [
    "Targets",
    "Target",
    "TargetOption",
    "TargetArmAds",
    "ArmAdsMisc",
];

/// A parsed ARM legacy project.
#[derive(Debug, Clone)]
pub struct ArmProject {
    /// The underlying round-trippable document.
    pub doc: XmlDocument,
    /// The parsed working model.
    pub model: KeilProjectModel,
    /// Toolchain variant the document targets.
    pub variant: ToolchainId,
}

impl ArmProject {
    /// Parse a `.uvprojx` document.
    pub fn parse(source: &str) -> Result<Self> {
        let doc = XmlDocument::parse(source)?;
        doc.read(|tree| {
            if find_element(tree, &ADS_BASE).is_none() {
                return Err(KeilError::UnsupportedFamily {
                    detail: "no TargetArmAds option block".to_string(),
                });
            }
            Ok(())
        })??;

        let variant = detect_variant(&doc);
        let options_base = cads_base();
        let mut model = model::parse_common(&doc, &options_base)?;
        model.options = import_options(&doc, variant);
        model.memory = import_memory(&doc);
        model.rte_deps = import_rte(&doc)?;
        Ok(ArmProject { doc, model, variant })
    }

    /// Load a `.uvprojx` file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Convert to the abstract project model.
    pub fn to_project(&self) -> Project {
        self.model.to_project(ProjectKind::Arm, self.variant.name())
    }

    /// Overwrite the target from the abstract project and option set.
    pub fn export(&mut self, project: &Project, options: &CompileOptionSet) -> Result<()> {
        model::export_common(&mut self.doc, project, &cads_base())?;
        export_options(&mut self.doc, self.variant, options);
        if let Some(memory) = &project.memory {
            export_memory(&mut self.doc, memory);
        }
        let mut model = model::parse_common(&self.doc, &cads_base())?;
        model.options = import_options(&self.doc, self.variant);
        model.memory = import_memory(&self.doc);
        model.rte_deps = import_rte(&self.doc)?;
        self.model = model;
        Ok(())
    }

    /// Write the (potentially mutated) document back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.doc.save(path)
    }
}

fn cads_base() -> Vec<&'static str> {
    ADS_BASE.iter().copied().chain(["Cads"]).collect()
}

/// AC6 documents carry `uAC6 = 1` in the common option block.
fn detect_variant(doc: &XmlDocument) -> ToolchainId {
    let ac6 = doc
        .read_text(&[
            "Targets",
            "Target",
            "TargetOption",
            "TargetCommonOption",
            "uAC6",
        ])
        .map(|v| v == "1")
        .unwrap_or(false);
    if ac6 {
        ToolchainId::Ac6
    } else {
        ToolchainId::Ac5
    }
}

/// Translate legacy option fields through the variant's field mapping.
///
/// A failing single field leaves that option at its default with one
/// warning; it never aborts the import.
fn import_options(doc: &XmlDocument, variant: ToolchainId) -> CompileOptionSet {
    let mut options = defaults::default_options(variant);
    let mapping = match mapping::mapping_for(variant) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("{e}; importing defaults only");
            return options;
        }
    };
    for (category, key, rule) in mapping.rules() {
        let path: Vec<&str> = ADS_BASE
            .iter()
            .copied()
            .chain(rule.position.iter().map(String::as_str))
            .collect();
        let Some(raw) = doc.read_text(&path) else {
            continue;
        };
        match mapping.from_legacy(rule, &raw) {
            Some(value) => options.set(category, key, value),
            None => log::warn!("cannot translate {category}/{key} from '{raw}', keeping default"),
        }
    }
    options
}

/// Write abstract options back through the variant's field mapping.
fn export_options(doc: &mut XmlDocument, variant: ToolchainId, options: &CompileOptionSet) {
    let mapping = match mapping::mapping_for(variant) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("{e}; skipping option export");
            return;
        }
    };
    for (category, key, rule) in mapping.rules() {
        let Some(value) = options.get(category, key) else {
            continue;
        };
        let Some(raw) = mapping.to_legacy(rule, value) else {
            log::warn!("cannot translate {category}/{key} to a legacy value");
            continue;
        };
        let path: Vec<&str> = ADS_BASE
            .iter()
            .copied()
            .chain(rule.position.iter().map(String::as_str))
            .collect();
        model::set_or_warn(doc, &path, &raw);
    }
}

/// Checkbox element for a ROM-family table index (1..=5).
fn rom_checkbox(index: u32) -> String {
    if index <= 3 {
        format!("Ro{index}Chk")
    } else {
        format!("Ir{}Chk", index - 3)
    }
}

/// Checkbox element for a RAM-family table index (1..=5).
fn ram_checkbox(index: u32) -> String {
    if index <= 3 {
        format!("Ra{index}Chk")
    } else {
        format!("Im{}Chk", index - 3)
    }
}

/// Legacy memory slot element. ROM table rows occupy `OCR_RVCT1..5`,
/// RAM rows `OCR_RVCT6..10`; this arithmetic is tied to the fixed
/// 5-slot layout.
fn ocr_name(is_rom: bool, index: u32) -> String {
    let n = if is_rom { index } else { index + 5 };
    format!("OCR_RVCT{n}")
}

/// Read the ten legacy memory slots back into the fixed table.
fn import_memory(doc: &XmlDocument) -> Option<MemoryLayout> {
    let on_chip = misc_path_tail(&[], "OnChipMemories");
    let present = doc
        .read(|tree| find_element(tree, &on_chip).is_some())
        .unwrap_or(false);
    if !present {
        return None;
    }

    let mut layout = MemoryLayout::empty();
    for index in 1..=5u32 {
        for is_rom in [true, false] {
            let ocr = ocr_name(is_rom, index);
            let base = ["OnChipMemories".to_string(), ocr];
            let start = doc.read_text(&misc_path_tail(&base, "StartAddress"));
            let size = doc.read_text(&misc_path_tail(&base, "Size"));
            let checkbox = if is_rom {
                rom_checkbox(index)
            } else {
                ram_checkbox(index)
            };
            let selected = doc
                .read_text(&misc_path_tail(&[], &checkbox))
                .map(|v| v == "1")
                .unwrap_or(false);

            let slot = if is_rom {
                layout.rom_slot_mut(index).ok()?
            } else {
                layout.ram_slot_mut(index).ok()?
            };
            if let Some(start) = start {
                slot.start = canonical_hex(&start).unwrap_or(start);
            }
            if let Some(size) = size {
                slot.size = canonical_hex(&size).unwrap_or(size);
            }
            slot.selected = selected;
            if !is_rom {
                slot.no_init = doc
                    .read_text(&misc_path_tail(&[], &format!("NoZi{index}")))
                    .map(|v| v == "1")
                    .unwrap_or(false);
            }
        }
    }
    if let Some(startup) = doc
        .read_text(&misc_path_tail(&[], "StupSel"))
        .and_then(|v| v.parse::<u32>().ok())
    {
        if let Ok(slot) = layout.rom_slot_mut(startup) {
            slot.is_startup = true;
        }
    }
    Some(layout)
}

fn misc_path_tail<'a>(base: &'a [String], tail: &'a str) -> Vec<&'a str> {
    MISC_BASE
        .iter()
        .copied()
        .chain(base.iter().map(String::as_str))
        .chain([tail])
        .collect()
}

/// Recompute all legacy memory fields from the fixed table, zeroing
/// everything first so no stale values survive.
fn export_memory(doc: &mut XmlDocument, layout: &MemoryLayout) {
    // Zero pass over all ten slots and every checkbox.
    for index in 1..=5u32 {
        for is_rom in [true, false] {
            let ocr = ocr_name(is_rom, index);
            let base = ["OnChipMemories".to_string(), ocr];
            model::set_or_warn(doc, &misc_path_tail(&base, "Type"), "0");
            model::set_or_warn(doc, &misc_path_tail(&base, "StartAddress"), "0x0");
            model::set_or_warn(doc, &misc_path_tail(&base, "Size"), "0x0");
            let checkbox = if is_rom {
                rom_checkbox(index)
            } else {
                ram_checkbox(index)
            };
            model::set_or_warn(doc, &misc_path_tail(&[], &checkbox), "0");
        }
        model::set_or_warn(doc, &misc_path_tail(&[], &format!("NoZi{index}")), "0");
    }
    model::set_or_warn(doc, &misc_path_tail(&[], "StupSel"), "0");

    // Write the selected subset.
    for (is_rom, regions) in [(true, &layout.rom), (false, &layout.ram)] {
        for (offset, region) in regions.iter().enumerate() {
            let index = offset as u32 + 1;
            if !region.selected {
                continue;
            }
            let ocr = ocr_name(is_rom, index);
            let base = ["OnChipMemories".to_string(), ocr];
            model::set_or_warn(doc, &misc_path_tail(&base, "Type"), "1");
            model::set_or_warn(doc, &misc_path_tail(&base, "StartAddress"), &region.start);
            model::set_or_warn(doc, &misc_path_tail(&base, "Size"), &region.size);
            let checkbox = if is_rom {
                rom_checkbox(index)
            } else {
                ram_checkbox(index)
            };
            model::set_or_warn(doc, &misc_path_tail(&[], &checkbox), "1");
            if !is_rom && region.no_init {
                model::set_or_warn(doc, &misc_path_tail(&[], &format!("NoZi{index}")), "1");
            }
            if is_rom && region.is_startup {
                model::set_or_warn(doc, &misc_path_tail(&[], "StupSel"), &index.to_string());
            }
        }
    }
}

/// Read RTE component references and their instantiated file paths.
fn import_rte(doc: &XmlDocument) -> Result<Vec<RteDependency>> {
    doc.read(|tree| {
        let Some(components) = find_element(tree, &["RTE", "components"]) else {
            return Vec::new();
        };

        // Instance paths live in the sibling files list, keyed by the
        // owning component's class/group pair.
        let mut instances: Vec<(String, String, String)> = Vec::new();
        if let Some(files) = find_element(tree, &["RTE", "files"]) {
            for file in files
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "file")
            {
                let Some(component) = model::child_element(file, "component") else {
                    continue;
                };
                let class = component.attribute("Cclass").unwrap_or("").to_string();
                let group = component.attribute("Cgroup").unwrap_or("").to_string();
                if let Some(instance) = model::child_text(file, "instance") {
                    instances.push((class, group, crate::strings::normalize_path(&instance)));
                }
            }
        }

        let mut deps = Vec::new();
        for component in components
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "component")
        {
            let class = component.attribute("Cclass").unwrap_or("").to_string();
            let category = component.attribute("Cgroup").unwrap_or("").to_string();
            let package_path = model::child_element(component, "package")
                .map(|p| {
                    format!(
                        "{}.{}.{}",
                        p.attribute("vendor").unwrap_or(""),
                        p.attribute("name").unwrap_or(""),
                        p.attribute("version").unwrap_or("")
                    )
                })
                .unwrap_or_default();
            let instance_paths = instances
                .iter()
                .filter(|(c, g, _)| *c == class && *g == category)
                .map(|(_, _, path)| path.clone())
                .collect();
            deps.push(RteDependency {
                class,
                category,
                package_path,
                instance_paths,
            });
        }
        deps
    })
}
