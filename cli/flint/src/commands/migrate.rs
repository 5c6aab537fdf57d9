//! `flint migrate` — migrate a toolchain option file forward.

use std::path::Path;

use anyhow::{bail, Result};

use flint_toolchain::descriptor::ToolchainId;
use flint_toolchain::{migrate, registry};

/// Migrate one option file to the toolchain's current schema version.
pub fn run(file: &Path, toolchain: &str) -> Result<()> {
    let Some(id) = ToolchainId::from_name(toolchain) else {
        bail!(
            "unknown toolchain '{toolchain}'. Known: {}",
            ToolchainId::ALL
                .iter()
                .map(|id| id.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };
    let descriptor = registry::descriptor(id);
    let options = migrate::migrate_file(file, &descriptor)?;
    println!(
        "{} is at schema version {}",
        file.display(),
        options.version
    );
    Ok(())
}
