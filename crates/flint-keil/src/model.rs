//! Shared in-memory model and tree helpers for legacy project documents.
//!
//! Both families (C51 and ARM) read the same target skeleton: target
//! name, device identity, output fields, and the file-group tree with
//! its nested common-property enable flags. Family-specific option and
//! memory handling lives in [`crate::c51`] and [`crate::arm`].

use flint_core::memory::MemoryLayout;
use flint_core::options::CompileOptionSet;
use flint_core::project::{
    normalize_group_name, DeviceInfo, FileGroup, Project, ProjectKind, RteDependency, SourceFile,
};

use crate::document::{find_element, XmlDocument, XmlRender};
use crate::error::Result;
use crate::strings::{
    file_type_code, join_macro_string, join_path_list, normalize_path, split_macro_string,
    split_path_list, to_keil_path,
};

/// Path from the document root to the (single) target element.
pub const TARGET_PATH: [&str; 2] = ["Targets", "Target"];

/// The legacy translator's working structure for one target.
#[derive(Debug, Clone)]
pub struct KeilProjectModel {
    /// Target name.
    pub target_name: String,
    /// Device name.
    pub device: String,
    /// Silicon vendor.
    pub vendor: String,
    /// Output directory (normalized separators).
    pub output_dir: String,
    /// Output artifact base name.
    pub output_name: String,
    /// Include directories (normalized).
    pub include_dirs: Vec<String>,
    /// Macro definitions.
    pub defines: Vec<String>,
    /// Ordered file groups with enable flags.
    pub groups: Vec<FileGroup>,
    /// Translated toolchain options.
    pub options: CompileOptionSet,
    /// Memory table (ARM family only).
    pub memory: Option<MemoryLayout>,
    /// External component references (ARM family only).
    pub rte_deps: Vec<RteDependency>,
}

impl KeilProjectModel {
    /// Convert to the abstract project model.
    pub fn to_project(&self, kind: ProjectKind, toolchain: &str) -> Project {
        Project {
            name: self.output_name.clone(),
            kind,
            toolchain: toolchain.to_string(),
            device: DeviceInfo {
                name: self.device.clone(),
                vendor: self.vendor.clone(),
                core: None,
                pack: None,
            },
            float_policy: Default::default(),
            groups: self.groups.clone(),
            include_dirs: self.include_dirs.clone(),
            library_dirs: Vec::new(),
            defines: self.defines.clone(),
            file_options: Vec::new(),
            memory: self.memory.clone(),
            env: Default::default(),
            output_dir: if self.output_dir.is_empty() {
                "build".to_string()
            } else {
                self.output_dir.clone()
            },
            rte_deps: self.rte_deps.clone(),
        }
    }
}

/// Text of a direct child element.
pub fn child_text(node: roxmltree::Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .map(|n| n.text().unwrap_or("").trim().to_string())
}

/// First direct child element with the given tag.
pub fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// The enable flag inside a nested common-property sub-object
/// (`IncludeInBuild`); absent means enabled.
fn include_in_build(option_node: Option<roxmltree::Node<'_, '_>>) -> bool {
    option_node
        .and_then(|n| child_element(n, "CommonProperty"))
        .and_then(|n| child_text(n, "IncludeInBuild"))
        .map(|v| v != "0")
        .unwrap_or(true)
}

/// Parse the target skeleton shared by both families.
///
/// `options_base` points at the family option element whose
/// `VariousControls` carries the include path and define list.
pub fn parse_common(doc: &XmlDocument, options_base: &[&str]) -> Result<KeilProjectModel> {
    doc.read(|tree| {
        let target = find_element(tree, &TARGET_PATH);
        let common = find_element(
            tree,
            &["Targets", "Target", "TargetOption", "TargetCommonOption"],
        );

        let mut include_dirs = Vec::new();
        let mut defines = Vec::new();
        let various: Vec<&str> = options_base
            .iter()
            .copied()
            .chain(["VariousControls"])
            .collect();
        if let Some(controls) = find_element(tree, &various) {
            if let Some(paths) = child_text(controls, "IncludePath") {
                include_dirs = split_path_list(&paths);
            }
            if let Some(raw) = child_text(controls, "Define") {
                defines = split_macro_string(&raw);
            }
        }

        KeilProjectModel {
            target_name: target
                .and_then(|t| child_text(t, "TargetName"))
                .unwrap_or_default(),
            device: common
                .and_then(|c| child_text(c, "Device"))
                .unwrap_or_default(),
            vendor: common
                .and_then(|c| child_text(c, "Vendor"))
                .unwrap_or_default(),
            output_dir: common
                .and_then(|c| child_text(c, "OutputDirectory"))
                .map(|p| normalize_path(p.trim_end_matches(['\\', '/'])))
                .unwrap_or_default(),
            output_name: common
                .and_then(|c| child_text(c, "OutputName"))
                .unwrap_or_default(),
            include_dirs,
            defines,
            groups: parse_groups(tree),
            options: CompileOptionSet::new(0),
            memory: None,
            rte_deps: Vec::new(),
        }
    })
}

/// Parse the file-group tree with per-group and per-file enable flags.
pub fn parse_groups(tree: &roxmltree::Document<'_>) -> Vec<FileGroup> {
    let Some(groups_node) = find_element(tree, &["Targets", "Target", "Groups"]) else {
        return Vec::new();
    };
    let mut groups = Vec::new();
    for group_node in groups_node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Group")
    {
        let name = normalize_group_name(&child_text(group_node, "GroupName").unwrap_or_default());
        let enabled = include_in_build(child_element(group_node, "GroupOption"));
        let mut files = Vec::new();
        if let Some(files_node) = child_element(group_node, "Files") {
            for file_node in files_node
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "File")
            {
                let Some(path) = child_text(file_node, "FilePath") else {
                    continue;
                };
                let path = normalize_path(&path);
                let file_name = child_text(file_node, "FileName")
                    .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string());
                files.push(SourceFile {
                    path,
                    enabled: include_in_build(child_element(file_node, "FileOption")),
                    virtual_path: Some(format!("{name}/{file_name}")),
                });
            }
        }
        // Keil groups are logical folders, not directories.
        groups.push(FileGroup {
            name,
            enabled,
            is_virtual: true,
            files,
        });
    }
    groups
}

/// Render the file-group tree back to legacy XML.
pub fn render_groups(groups: &[FileGroup], depth: usize) -> String {
    let mut render = XmlRender::new(depth);
    render.open("Groups");
    for group in groups {
        render.open("Group");
        render.leaf("GroupName", &group.name);
        if !group.enabled {
            render.open("GroupOption");
            render.open("CommonProperty");
            render.leaf("IncludeInBuild", "0");
            render.close("CommonProperty");
            render.close("GroupOption");
        }
        render.open("Files");
        for file in &group.files {
            let file_name = file.path.rsplit('/').next().unwrap_or(&file.path);
            render.open("File");
            render.leaf("FileName", file_name);
            render.leaf("FileType", &file_type_code(&file.path).to_string());
            render.leaf("FilePath", &to_keil_path(&file.path));
            if !file.enabled {
                render.open("FileOption");
                render.open("CommonProperty");
                render.leaf("IncludeInBuild", "0");
                render.close("CommonProperty");
                render.close("FileOption");
            }
            render.close("File");
        }
        render.close("Files");
        render.close("Group");
    }
    render.close("Groups");
    render.finish()
}

/// Set one element's text, downgrading a missing node to a warning so a
/// single absent field never aborts a whole export.
pub fn set_or_warn(doc: &mut XmlDocument, path: &[&str], value: &str) {
    if let Err(e) = doc.set_text(path, value) {
        log::warn!("export: {e}");
    }
}

/// Overwrite the target skeleton from the abstract project: name,
/// device, vendor, output fields, flattened include/define lists, and
/// the whole file-group tree.
pub fn export_common(doc: &mut XmlDocument, project: &Project, options_base: &[&str]) -> Result<()> {
    set_or_warn(doc, &["Targets", "Target", "TargetName"], &project.name);
    let common = ["Targets", "Target", "TargetOption", "TargetCommonOption"];
    set_or_warn(doc, &with(&common, "Device"), &project.device.name);
    set_or_warn(doc, &with(&common, "Vendor"), &project.device.vendor);
    set_or_warn(
        doc,
        &with(&common, "OutputDirectory"),
        &format!("{}\\", to_keil_path(&project.output_dir)),
    );
    set_or_warn(doc, &with(&common, "OutputName"), &project.name);

    let various: Vec<&str> = options_base
        .iter()
        .copied()
        .chain(["VariousControls"])
        .collect();
    set_or_warn(
        doc,
        &with(&various, "IncludePath"),
        &join_path_list(&project.include_dirs),
    );
    set_or_warn(
        doc,
        &with(&various, "Define"),
        &join_macro_string(&project.defines),
    );

    // Full overwrite of the group tree; no field-level diffing.
    let rendered = render_groups(&project.groups, TARGET_PATH.len() + 1);
    doc.replace_element(
        &["Targets", "Target", "Groups"],
        rendered.trim_start(),
    )?;
    Ok(())
}

fn with<'a>(base: &[&'a str], tail: &'a str) -> Vec<&'a str> {
    base.iter().copied().chain([tail]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Project>
  <Targets>
    <Target>
      <TargetName>Target 1</TargetName>
      <TargetOption>
        <TargetCommonOption>
          <Device>AT89C52</Device>
          <Vendor>Atmel</Vendor>
          <OutputDirectory>.\Objects\</OutputDirectory>
          <OutputName>demo</OutputName>
        </TargetCommonOption>
        <Target51>
          <C51>
            <VariousControls>
              <MiscControls></MiscControls>
              <Define>USE_LED, F_OSC=11059200</Define>
              <IncludePath>.\inc;.\src\common</IncludePath>
            </VariousControls>
          </C51>
        </Target51>
      </TargetOption>
      <Groups>
        <Group>
          <GroupName>\src</GroupName>
          <Files>
            <File>
              <FileName>main.c</FileName>
              <FileType>1</FileType>
              <FilePath>.\src\main.c</FilePath>
            </File>
            <File>
              <FileName>legacy.c</FileName>
              <FileType>1</FileType>
              <FilePath>.\src\legacy.c</FilePath>
              <FileOption>
                <CommonProperty>
                  <IncludeInBuild>0</IncludeInBuild>
                </CommonProperty>
              </FileOption>
            </File>
          </Files>
        </Group>
        <Group>
          <GroupName>docs</GroupName>
          <GroupOption>
            <CommonProperty>
              <IncludeInBuild>0</IncludeInBuild>
            </CommonProperty>
          </GroupOption>
          <Files>
          </Files>
        </Group>
      </Groups>
    </Target>
  </Targets>
</Project>
"#;

    const C51_BASE: [&str; 4] = ["Targets", "Target", "TargetOption", "Target51"];

    fn c51_options_base() -> Vec<&'static str> {
        C51_BASE.iter().copied().chain(["C51"]).collect()
    }

    #[test]
    fn parse_common_reads_target_skeleton() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let model = parse_common(&doc, &c51_options_base()).unwrap();
        assert_eq!(model.target_name, "Target 1");
        assert_eq!(model.device, "AT89C52");
        assert_eq!(model.vendor, "Atmel");
        assert_eq!(model.output_dir, "Objects");
        assert_eq!(model.output_name, "demo");
        assert_eq!(model.include_dirs, ["inc", "src/common"]);
        assert_eq!(model.defines, ["USE_LED", "F_OSC=11059200"]);
    }

    #[test]
    fn parse_groups_reads_enable_flags() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let model = parse_common(&doc, &c51_options_base()).unwrap();
        assert_eq!(model.groups.len(), 2);

        let src = &model.groups[0];
        // Leading separator stripped from the group name.
        assert_eq!(src.name, "src");
        assert!(src.enabled);
        assert_eq!(src.files.len(), 2);
        assert_eq!(src.files[0].path, "src/main.c");
        assert!(src.files[0].enabled);
        assert_eq!(src.files[0].virtual_path.as_deref(), Some("src/main.c"));
        assert!(!src.files[1].enabled);

        assert!(!model.groups[1].enabled);
    }

    #[test]
    fn group_render_parse_round_trip() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let model = parse_common(&doc, &c51_options_base()).unwrap();

        let rendered = format!(
            "<Project><Targets><Target>{}</Target></Targets></Project>",
            render_groups(&model.groups, 0)
        );
        let redoc = XmlDocument::parse(rendered).unwrap();
        let reparsed = redoc.read(|tree| parse_groups(tree)).unwrap();
        assert_eq!(reparsed, model.groups);
    }

    #[test]
    fn export_common_overwrites_skeleton() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let model = parse_common(&doc, &c51_options_base()).unwrap();
        let mut project = model.to_project(ProjectKind::C51, "Keil_C51");
        project.name = "renamed".to_string();
        project.device.name = "STC89C52RC".to_string();
        project.groups[0].files[1].enabled = true;

        export_common(&mut doc, &project, &c51_options_base()).unwrap();
        assert!(doc.source().contains("<TargetName>renamed</TargetName>"));
        assert!(doc.source().contains("<Device>STC89C52RC</Device>"));
        assert!(doc.source().contains("<OutputName>renamed</OutputName>"));

        // The re-enabled file no longer carries a disable flag.
        let reparsed = parse_common(&doc, &c51_options_base()).unwrap();
        assert!(reparsed.groups[0].files[1].enabled);
    }
}
