//! `flint export` — write the project back into a legacy Keil document.

use std::path::Path;

use anyhow::{bail, Context, Result};

use flint_keil::arm::ArmProject;
use flint_keil::c51::C51Project;
use flint_toolchain::{migrate, registry};

use crate::manifest::FlintManifest;

/// Overwrite an existing legacy project file from the flint project.
pub fn run(project_dir: &Path, target: &Path) -> Result<()> {
    let manifest = FlintManifest::load(project_dir)?;
    let project = manifest.to_project()?;
    let descriptor = registry::resolve(project.kind, &project.toolchain);

    let option_file = project_dir.join(descriptor.id.config_file_name());
    let options = if option_file.is_file() {
        match migrate::migrate_file(&option_file, &descriptor) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("{e}; exporting default options");
                descriptor.default_options()
            }
        }
    } else {
        descriptor.default_options()
    };

    let extension = target
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "uvprojx" => {
            let mut legacy = ArmProject::from_file(target)
                .with_context(|| format!("parsing {}", target.display()))?;
            legacy.export(&project, &options)?;
            legacy.save(target)?;
        }
        "uvproj" => {
            let mut legacy = C51Project::from_file(target)
                .with_context(|| format!("parsing {}", target.display()))?;
            legacy.export(&project, &options)?;
            legacy.save(target)?;
        }
        other => bail!("unsupported project extension '.{other}' (expected .uvproj or .uvprojx)"),
    }

    println!("exported '{}' into {}", project.name, target.display());
    Ok(())
}
