//! Toolchain identity and capability descriptors.
//!
//! [`ToolchainId`] is the closed set of supported compiler families. A
//! [`ToolchainDescriptor`] binds one identity to a concrete installation
//! root and exposes the capability surface the build parameter compiler
//! consumes: default options, system includes, intrinsic macros, library
//! directories, and the pre-handle transform.

use std::path::{Path, PathBuf};

use flint_core::options::CompileOptionSet;
use flint_core::project::ProjectKind;

use crate::defaults;
use crate::prehandle::{self, PreHandleContext};
use crate::probe;
use crate::schema::{self, PropertyTable};

/// The closed set of supported toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolchainId {
    /// ARM Compiler 5 (armcc).
    Ac5,
    /// ARM Compiler 6 (armclang).
    Ac6,
    /// GNU GCC for ARM.
    ArmGcc,
    /// GNU GCC for RISC-V.
    RiscvGcc,
    /// Keil C51.
    Keil51,
    /// Small Device C Compiler.
    Sdcc,
    /// IAR for STM8.
    IarStm8,
}

impl ToolchainId {
    /// Every supported toolchain, in registry order.
    pub const ALL: [ToolchainId; 7] = [
        ToolchainId::Ac5,
        ToolchainId::Ac6,
        ToolchainId::ArmGcc,
        ToolchainId::RiscvGcc,
        ToolchainId::Keil51,
        ToolchainId::Sdcc,
        ToolchainId::IarStm8,
    ];

    /// Canonical name, as written in project files.
    pub fn name(self) -> &'static str {
        match self {
            ToolchainId::Ac5 => "AC5",
            ToolchainId::Ac6 => "AC6",
            ToolchainId::ArmGcc => "GCC",
            ToolchainId::RiscvGcc => "RISCV_GCC",
            ToolchainId::Keil51 => "Keil_C51",
            ToolchainId::Sdcc => "SDCC",
            ToolchainId::IarStm8 => "IAR_STM8",
        }
    }

    /// Parse a canonical name back to an identity.
    pub fn from_name(name: &str) -> Option<Self> {
        ToolchainId::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Family category label.
    pub fn category(self) -> &'static str {
        match self {
            ToolchainId::Ac5 | ToolchainId::Ac6 | ToolchainId::ArmGcc => "ARM",
            ToolchainId::RiscvGcc => "RISCV",
            ToolchainId::Keil51 | ToolchainId::Sdcc => "C51",
            ToolchainId::IarStm8 => "STM8",
        }
    }

    /// Name of the per-project option file for this toolchain.
    pub fn config_file_name(self) -> &'static str {
        match self {
            ToolchainId::Ac5 => "arm.ac5.options.json",
            ToolchainId::Ac6 => "arm.ac6.options.json",
            ToolchainId::ArmGcc => "arm.gcc.options.json",
            ToolchainId::RiscvGcc => "riscv.gcc.options.json",
            ToolchainId::Keil51 => "c51.keil.options.json",
            ToolchainId::Sdcc => "c51.sdcc.options.json",
            ToolchainId::IarStm8 => "stm8.iar.options.json",
        }
    }

    /// Current option schema version for this toolchain.
    pub fn schema_version(self) -> u32 {
        match self {
            ToolchainId::Ac5 => 4,
            ToolchainId::Ac6 => 3,
            ToolchainId::ArmGcc => 3,
            ToolchainId::RiscvGcc => 2,
            ToolchainId::Keil51 => 2,
            ToolchainId::Sdcc => 3,
            ToolchainId::IarStm8 => 2,
        }
    }

    /// Environment variable naming this toolchain's installation root.
    pub fn home_env_var(self) -> &'static str {
        match self {
            ToolchainId::Ac5 => "FLINT_AC5_HOME",
            ToolchainId::Ac6 => "FLINT_AC6_HOME",
            ToolchainId::ArmGcc => "FLINT_GCC_ARM_HOME",
            ToolchainId::RiscvGcc => "FLINT_GCC_RISCV_HOME",
            ToolchainId::Keil51 => "FLINT_KEIL_C51_HOME",
            ToolchainId::Sdcc => "FLINT_SDCC_HOME",
            ToolchainId::IarStm8 => "FLINT_IAR_STM8_HOME",
        }
    }

    /// Built-in installation root used when the env var is unset.
    pub fn default_home(self) -> &'static str {
        match self {
            ToolchainId::Ac5 => "/opt/arm-compiler-5",
            ToolchainId::Ac6 => "/opt/arm-compiler-6",
            ToolchainId::ArmGcc => "/usr",
            ToolchainId::RiscvGcc => "/opt/riscv-gcc",
            ToolchainId::Keil51 => "/opt/keil-c51",
            ToolchainId::Sdcc => "/usr",
            ToolchainId::IarStm8 => "/opt/iar-stm8",
        }
    }

    /// Compiler executable name, relative to `<root>/bin`.
    pub fn exe_name(self) -> &'static str {
        match self {
            ToolchainId::Ac5 => "armcc",
            ToolchainId::Ac6 => "armclang",
            ToolchainId::ArmGcc => "arm-none-eabi-gcc",
            ToolchainId::RiscvGcc => "riscv32-unknown-elf-gcc",
            ToolchainId::Keil51 => "c51",
            ToolchainId::Sdcc => "sdcc",
            ToolchainId::IarStm8 => "iccstm8",
        }
    }

    /// The allow-list and default toolchain for a project family.
    pub fn family(kind: ProjectKind) -> (&'static [ToolchainId], ToolchainId) {
        match kind {
            ProjectKind::Arm => (
                &[ToolchainId::Ac5, ToolchainId::Ac6, ToolchainId::ArmGcc],
                ToolchainId::Ac5,
            ),
            ProjectKind::C51 => (
                &[ToolchainId::Keil51, ToolchainId::Sdcc, ToolchainId::IarStm8],
                ToolchainId::Keil51,
            ),
            ProjectKind::RiscV => (&[ToolchainId::RiscvGcc], ToolchainId::RiscvGcc),
        }
    }
}

/// A toolchain identity bound to a concrete installation root.
#[derive(Debug, Clone)]
pub struct ToolchainDescriptor {
    /// Toolchain identity.
    pub id: ToolchainId,
    /// Option schema version this descriptor serves.
    pub version: u32,
    root: PathBuf,
}

impl ToolchainDescriptor {
    /// Construct a descriptor, resolving the installation root from the
    /// identity's env var or its built-in default.
    pub fn new(id: ToolchainId) -> Self {
        let root = std::env::var_os(id.home_env_var())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(id.default_home()));
        ToolchainDescriptor {
            id,
            version: id.schema_version(),
            root,
        }
    }

    /// Installation root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Full path to the compiler executable.
    pub fn exe_path(&self) -> PathBuf {
        self.root.join("bin").join(self.id.exe_name())
    }

    /// Whether the installation looks usable.
    pub fn is_ready(&self) -> bool {
        self.exe_path().is_file()
    }

    /// An immutable default option template (cloned, never the live set).
    pub fn default_options(&self) -> CompileOptionSet {
        defaults::default_options(self.id)
    }

    /// The valid-key schema for this toolchain's option categories.
    pub fn property_table(&self) -> &'static PropertyTable {
        schema::property_table(self.id)
    }

    /// System include directories shipped with the toolchain.
    pub fn system_include_dirs(&self) -> Vec<PathBuf> {
        let sub: &[&str] = match self.id {
            ToolchainId::Ac5 | ToolchainId::Ac6 => &["include"],
            ToolchainId::ArmGcc => &["arm-none-eabi/include"],
            ToolchainId::RiscvGcc => &["riscv32-unknown-elf/include"],
            ToolchainId::Keil51 => &["C51/INC"],
            ToolchainId::Sdcc => &["share/sdcc/include"],
            ToolchainId::IarStm8 => &["stm8/inc"],
        };
        sub.iter().map(|s| self.root.join(s)).collect()
    }

    /// Library directories shipped with the toolchain.
    pub fn library_dirs(&self) -> Vec<PathBuf> {
        let sub: &[&str] = match self.id {
            ToolchainId::Ac5 | ToolchainId::Ac6 => &["lib"],
            ToolchainId::ArmGcc => &["arm-none-eabi/lib"],
            ToolchainId::RiscvGcc => &["riscv32-unknown-elf/lib"],
            ToolchainId::Keil51 => &["C51/LIB"],
            ToolchainId::Sdcc => &["share/sdcc/lib"],
            ToolchainId::IarStm8 => &["stm8/lib"],
        };
        sub.iter().map(|s| self.root.join(s)).collect()
    }

    /// Headers force-included into every translation unit. Empty for the
    /// stock toolchains; device packs may extend the build request.
    pub fn force_include_headers(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Compiler-intrinsic macro definitions.
    ///
    /// Probed once per process lifetime from the real compiler where it
    /// supports a dump mode; toolchains without one fall back to a static
    /// seed list.
    pub fn intrinsic_macros(&self) -> Vec<String> {
        probe::probe(self).macros.clone()
    }

    /// Apply the toolchain-specific pre-handle transform to an option set.
    pub fn pre_handle_options(&self, ctx: &mut PreHandleContext<'_>, options: &mut CompileOptionSet) {
        prehandle::pre_handle(self, ctx, options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for id in ToolchainId::ALL {
            assert_eq!(ToolchainId::from_name(id.name()), Some(id));
        }
        assert_eq!(ToolchainId::from_name("AC4"), None);
    }

    #[test]
    fn family_defaults_stay_inside_allow_list() {
        for kind in [ProjectKind::Arm, ProjectKind::C51, ProjectKind::RiscV] {
            let (allowed, default) = ToolchainId::family(kind);
            assert!(allowed.contains(&default));
        }
    }

    #[test]
    fn env_var_overrides_root() {
        // Pick an identity no other test constructs through the env var.
        std::env::set_var("FLINT_IAR_STM8_HOME", "/custom/iar");
        let desc = ToolchainDescriptor::new(ToolchainId::IarStm8);
        assert_eq!(desc.root_dir(), Path::new("/custom/iar"));
        assert_eq!(desc.exe_path(), PathBuf::from("/custom/iar/bin/iccstm8"));
        std::env::remove_var("FLINT_IAR_STM8_HOME");
    }

    #[test]
    fn schema_version_matches_descriptor() {
        let desc = ToolchainDescriptor::new(ToolchainId::Ac5);
        assert_eq!(desc.version, ToolchainId::Ac5.schema_version());
    }
}
