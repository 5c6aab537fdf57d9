//! `flint import` — convert a legacy Keil project into a flint manifest.

use std::path::Path;

use anyhow::{bail, Context, Result};

use flint_keil::arm::ArmProject;
use flint_keil::c51::C51Project;
use flint_toolchain::registry;

use crate::manifest::FlintManifest;

/// Import a `.uvproj`/`.uvprojx` file, writing `flint.toml` and the
/// translated option file into `out_dir`.
pub fn run(input: &Path, out_dir: &Path) -> Result<()> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (project, options) = match extension.as_str() {
        "uvprojx" => {
            let legacy = ArmProject::from_file(input)
                .with_context(|| format!("parsing {}", input.display()))?;
            (legacy.to_project(), legacy.model.options)
        }
        "uvproj" => {
            let legacy = C51Project::from_file(input)
                .with_context(|| format!("parsing {}", input.display()))?;
            (legacy.to_project(), legacy.model.options)
        }
        other => bail!("unsupported project extension '.{other}' (expected .uvproj or .uvprojx)"),
    };

    std::fs::create_dir_all(out_dir)?;
    FlintManifest::from_project(&project).save(out_dir)?;

    let descriptor = registry::resolve(project.kind, &project.toolchain);
    let option_file = out_dir.join(descriptor.id.config_file_name());
    std::fs::write(&option_file, serde_json::to_string_pretty(&options)?)?;

    println!(
        "imported '{}' ({} groups, {} defines) for {}",
        project.name,
        project.groups.len(),
        project.defines.len(),
        descriptor.id.name()
    );
    println!("wrote {}", out_dir.join(crate::manifest::MANIFEST_FILE_NAME).display());
    println!("wrote {}", option_file.display());
    Ok(())
}
