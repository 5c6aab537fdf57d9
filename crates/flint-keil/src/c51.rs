//! Family A: C51 (`.uvproj`) project translation.
//!
//! Option translation here is hand-coded: the format carries exactly two
//! recognized toolchain options, the memory-model tri-state and the
//! optimization tri-state. Everything else flows through the shared
//! target skeleton.

use std::path::Path;

use flint_core::options::{CompileOptionSet, OptionValue, CATEGORY_C_CPP};
use flint_core::project::{Project, ProjectKind};
use flint_toolchain::defaults;
use flint_toolchain::descriptor::ToolchainId;

use crate::document::XmlDocument;
use crate::error::{KeilError, Result};
use crate::model::{self, KeilProjectModel};

const OPTIONS_BASE: [&str; 5] = ["Targets", "Target", "TargetOption", "Target51", "C51"];

const MEMORY_MODELS: [(&str, &str); 3] = [("small", "0"), ("compact", "1"), ("large", "2")];
const OPTIMIZATIONS: [(&str, &str); 3] = [("speed", "0"), ("balanced", "1"), ("size", "2")];

/// A parsed C51 legacy project.
#[derive(Debug, Clone)]
pub struct C51Project {
    /// The underlying round-trippable document.
    pub doc: XmlDocument,
    /// The parsed working model.
    pub model: KeilProjectModel,
}

impl C51Project {
    /// Parse a `.uvproj` document.
    pub fn parse(source: &str) -> Result<Self> {
        let doc = XmlDocument::parse(source)?;
        doc.read(|tree| {
            if crate::document::find_element(tree, &OPTIONS_BASE[..4]).is_none() {
                return Err(KeilError::UnsupportedFamily {
                    detail: "no Target51 option block".to_string(),
                });
            }
            Ok(())
        })??;

        let mut model = model::parse_common(&doc, &OPTIONS_BASE)?;
        model.options = import_options(&doc);
        Ok(C51Project { doc, model })
    }

    /// Load a `.uvproj` file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Convert to the abstract project model.
    pub fn to_project(&self) -> Project {
        self.model.to_project(ProjectKind::C51, ToolchainId::Keil51.name())
    }

    /// Overwrite the target from the abstract project and option set.
    pub fn export(&mut self, project: &Project, options: &CompileOptionSet) -> Result<()> {
        model::export_common(&mut self.doc, project, &OPTIONS_BASE)?;
        export_options(&mut self.doc, options);
        self.model = model::parse_common(&self.doc, &OPTIONS_BASE)?;
        self.model.options = import_options(&self.doc);
        Ok(())
    }

    /// Write the (potentially mutated) document back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.doc.save(path)
    }
}

fn code_to_key(table: &[(&str, &str)], code: &str) -> Option<String> {
    table
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(k, _)| k.to_string())
}

fn key_to_code(table: &[(&str, &str)], key: &str) -> Option<String> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, c)| c.to_string())
}

/// Read the two hand-coded options, leaving defaults for anything the
/// document does not carry.
fn import_options(doc: &XmlDocument) -> CompileOptionSet {
    let mut options = defaults::default_options(ToolchainId::Keil51);

    let mut import_one = |tag: &str, table: &[(&str, &str)], key: &str| {
        let path: Vec<&str> = OPTIONS_BASE.iter().copied().chain([tag]).collect();
        let Some(raw) = doc.read_text(&path) else {
            return;
        };
        match code_to_key(table, &raw) {
            Some(value) => options.set(CATEGORY_C_CPP, key, value),
            None => log::warn!("unrecognized C51 {tag} code '{raw}', keeping default"),
        }
    };
    import_one("MemoryModel", &MEMORY_MODELS, "memory-model");
    import_one("Optimize", &OPTIMIZATIONS, "optimization");
    options
}

/// Write the two hand-coded options back to their legacy fields.
fn export_options(doc: &mut XmlDocument, options: &CompileOptionSet) {
    let mut export_one = |tag: &str, table: &[(&str, &str)], key: &str| {
        let Some(OptionValue::Text(value)) = options.get(CATEGORY_C_CPP, key) else {
            return;
        };
        match key_to_code(table, value) {
            Some(code) => {
                let path: Vec<&str> = OPTIONS_BASE.iter().copied().chain([tag]).collect();
                model::set_or_warn(doc, &path, &code);
            }
            None => log::warn!("no C51 {tag} code for '{value}', leaving field unchanged"),
        }
    };
    export_one("MemoryModel", &MEMORY_MODELS, "memory-model");
    export_one("Optimize", &OPTIMIZATIONS, "optimization");
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Project>
  <SchemaVersion>1.1</SchemaVersion>
  <Targets>
    <Target>
      <TargetName>demo</TargetName>
      <TargetOption>
        <TargetCommonOption>
          <Device>AT89C52</Device>
          <Vendor>Atmel</Vendor>
          <OutputDirectory>.\Objects\</OutputDirectory>
          <OutputName>demo</OutputName>
        </TargetCommonOption>
        <Target51>
          <C51>
            <MemoryModel>1</MemoryModel>
            <Optimize>2</Optimize>
            <VariousControls>
              <MiscControls></MiscControls>
              <Define>F_OSC=11059200</Define>
              <IncludePath>.\inc</IncludePath>
            </VariousControls>
          </C51>
        </Target51>
      </TargetOption>
      <Groups>
        <Group>
          <GroupName>src</GroupName>
          <Files>
            <File>
              <FileName>main.c</FileName>
              <FileType>1</FileType>
              <FilePath>.\src\main.c</FilePath>
            </File>
          </Files>
        </Group>
      </Groups>
    </Target>
  </Targets>
</Project>
"#;

    #[test]
    fn parse_reads_hand_coded_options() {
        let project = C51Project::parse(SAMPLE).unwrap();
        assert_eq!(
            project
                .model
                .options
                .get(CATEGORY_C_CPP, "memory-model")
                .and_then(|v| v.as_text()),
            Some("compact")
        );
        assert_eq!(
            project
                .model
                .options
                .get(CATEGORY_C_CPP, "optimization")
                .and_then(|v| v.as_text()),
            Some("size")
        );
    }

    #[test]
    fn unknown_codes_keep_defaults() {
        let source = SAMPLE.replace("<MemoryModel>1</MemoryModel>", "<MemoryModel>9</MemoryModel>");
        let project = C51Project::parse(&source).unwrap();
        assert_eq!(
            project
                .model
                .options
                .get(CATEGORY_C_CPP, "memory-model")
                .and_then(|v| v.as_text()),
            Some("small")
        );
    }

    #[test]
    fn arm_documents_are_rejected() {
        let source = SAMPLE.replace("Target51", "TargetArmAds");
        let err = C51Project::parse(&source).unwrap_err();
        assert!(matches!(err, KeilError::UnsupportedFamily { .. }));
    }

    #[test]
    fn import_export_round_trips_semantically() {
        let mut legacy = C51Project::parse(SAMPLE).unwrap();
        let abstract_project = legacy.to_project();
        let options = legacy.model.options.clone();

        // No abstract-model edits: export then re-import.
        legacy.export(&abstract_project, &options).unwrap();
        let reimported = C51Project::parse(legacy.doc.source()).unwrap();

        assert_eq!(reimported.model.device, "AT89C52");
        assert_eq!(reimported.model.vendor, "Atmel");
        assert_eq!(reimported.model.include_dirs, ["inc"]);
        assert_eq!(reimported.model.defines, ["F_OSC=11059200"]);
        assert_eq!(reimported.model.groups, legacy.model.groups);
        assert_eq!(reimported.model.options, options);
    }

    #[test]
    fn export_writes_option_codes() {
        let mut legacy = C51Project::parse(SAMPLE).unwrap();
        let project = legacy.to_project();
        let mut options = legacy.model.options.clone();
        options.set(CATEGORY_C_CPP, "memory-model", "large");
        options.set(CATEGORY_C_CPP, "optimization", "speed");

        legacy.export(&project, &options).unwrap();
        assert!(legacy.doc.source().contains("<MemoryModel>2</MemoryModel>"));
        assert!(legacy.doc.source().contains("<Optimize>0</Optimize>"));
    }
}
