//! `flint doctor` — toolchain installation readiness report.

use anyhow::Result;

use flint_toolchain::descriptor::ToolchainId;
use flint_toolchain::registry;

/// Report which toolchain installations look usable.
pub fn run() -> Result<()> {
    println!("Toolchain installations:");
    println!();
    for id in ToolchainId::ALL {
        let descriptor = registry::descriptor(id);
        let status = if descriptor.is_ready() { "ok" } else { "missing" };
        println!(
            "  {:<10} {:<8} {}",
            id.name(),
            status,
            descriptor.exe_path().display()
        );
    }
    println!();
    println!("Set FLINT_<TOOLCHAIN>_HOME to point at a different installation root.");
    Ok(())
}
