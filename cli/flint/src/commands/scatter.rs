//! `flint scatter` — generate the linker scatter file.

use std::path::Path;

use anyhow::{bail, Context, Result};

use flint_build::scatter;

use crate::manifest::FlintManifest;

/// Render the scatter description from the project memory table.
pub fn run(project_dir: &Path) -> Result<()> {
    let manifest = FlintManifest::load(project_dir)?;
    let project = manifest.to_project()?;
    let Some(memory) = &project.memory else {
        bail!("the project has no memory table; add [[memory.rom]] / [[memory.ram]] entries");
    };

    let text = scatter::render(memory).context("generating scatter description")?;
    let out_dir = project_dir.join(&project.output_dir);
    std::fs::create_dir_all(&out_dir)?;
    let path = out_dir.join(format!("{}.sct", project.name));
    std::fs::write(&path, text)?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[project]
name = "demo"
kind = "arm"
toolchain = "AC5"

[device]
name = "STM32F103C8"
vendor = "ST"

[[memory.rom]]
slot = 3
start = "0x08000000"
size = "0x00020000"
startup = true

[[memory.ram]]
slot = 1
start = "0x20000000"
size = "0x00008000"
"#;

    #[test]
    fn scatter_command_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("flint.toml"), MANIFEST).unwrap();

        run(dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("build/demo.sct")).unwrap();
        assert!(text.contains("LR_ROM3 0x08000000 0x00020000 {"));
        assert!(text.contains("RW_RAM1 0x20000000 0x00008000 {"));
    }

    #[test]
    fn missing_memory_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = MANIFEST
            .lines()
            .take_while(|l| !l.starts_with("[[memory"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(dir.path().join("flint.toml"), manifest).unwrap();
        assert!(run(dir.path()).is_err());
    }
}
