//! `flint build` — compile and persist the build request artifact.

use std::path::Path;

use anyhow::{Context, Result};

use flint_build::{compile, params};
use flint_toolchain::{migrate, registry};

use crate::manifest::FlintManifest;

/// Compile the build request and write it for the external builder.
pub fn run(project_dir: &Path) -> Result<()> {
    let manifest = FlintManifest::load(project_dir)?;
    let project = manifest.to_project()?;
    let descriptor = registry::resolve(project.kind, &project.toolchain);

    // Migration failures are recoverable: warn and keep defaults for the
    // session, leaving the file on disk untouched.
    let option_file = project_dir.join(descriptor.id.config_file_name());
    let options = if option_file.is_file() {
        match migrate::migrate_file(&option_file, &descriptor) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("{e}; using default options for this build");
                descriptor.default_options()
            }
        }
    } else {
        descriptor.default_options()
    };

    let out_dir = project_dir.join(&project.output_dir);
    let previous = params::load_previous(&out_dir);
    let request = compile::compile(&project, project_dir, options, previous.as_ref())
        .context("compiling build parameters")?;
    let path = params::write_params(&out_dir, &request)?;

    println!(
        "{}: {} sources, {:?} build",
        request.toolchain,
        request.sources.len(),
        request.mode
    );
    println!("wrote {}", path.display());
    Ok(())
}
