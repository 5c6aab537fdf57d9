//! Toolchain-specific option pre-handling.
//!
//! Runs over a build request's option set immediately before emission:
//! maps the shared `lib` output-format concept onto each toolchain's
//! linker-invocation token, derives CPU/FPU identifier strings for ARM
//! targets, and injects compiler-intrinsic macros into the request's
//! define list.

use flint_core::options::{CompileOptionSet, CATEGORY_GLOBAL, CATEGORY_LINKER};
use flint_core::project::{FloatPolicy, ProjectKind};

use crate::descriptor::{ToolchainDescriptor, ToolchainId};

/// Hardware floating-point capability derived for a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpuKind {
    /// No hardware FPU.
    None,
    /// Single-precision FPU.
    Single,
    /// Double-precision FPU.
    Double,
}

impl FpuKind {
    /// Short identifier used in option values.
    pub fn suffix(self) -> &'static str {
        match self {
            FpuKind::None => "none",
            FpuKind::Single => "sp",
            FpuKind::Double => "dp",
        }
    }
}

/// Mutable request state the pre-handle transform may touch besides the
/// option set itself.
pub struct PreHandleContext<'a> {
    /// Project family.
    pub kind: ProjectKind,
    /// Device CPU core name (e.g. "cortex-m4"), when known.
    pub core: Option<&'a str>,
    /// Requested floating-point policy.
    pub float_policy: FloatPolicy,
    /// The request's macro-definition list; intrinsic macros are appended.
    pub defines: &'a mut Vec<String>,
}

/// Apply the toolchain's pre-handle transform in place.
pub fn pre_handle(
    descriptor: &ToolchainDescriptor,
    ctx: &mut PreHandleContext<'_>,
    options: &mut CompileOptionSet,
) {
    apply_lib_output_format(descriptor.id, options);

    if matches!(ctx.kind, ProjectKind::Arm) {
        if let Some(core) = ctx.core {
            apply_cpu_fpu(descriptor.id, core, ctx.float_policy, options);
        }
    }

    for macro_def in descriptor.intrinsic_macros() {
        if !ctx.defines.contains(&macro_def) {
            ctx.defines.push(macro_def);
        }
    }
}

/// Map the shared `lib` output-format concept onto the toolchain's own
/// linker-invocation token, written to `linker.$use`.
fn apply_lib_output_format(id: ToolchainId, options: &mut CompileOptionSet) {
    let is_lib = options
        .get(CATEGORY_LINKER, "output-format")
        .and_then(|v| v.as_text())
        == Some("lib");
    if !is_lib {
        return;
    }
    let token = match id {
        ToolchainId::Ac5 | ToolchainId::Ac6 | ToolchainId::ArmGcc | ToolchainId::RiscvGcc => {
            "linker-lib"
        }
        ToolchainId::Keil51 => "lib51",
        ToolchainId::Sdcc => "sdar",
        ToolchainId::IarStm8 => "iarchive",
    };
    options.set(CATEGORY_LINKER, "$use", token);
}

/// Derive the effective FPU capability for a core and float policy.
///
/// Cores ending in `m33`, `m4`, or `m7` accept a hardware-FP suffix;
/// single precision is valid on all three, double precision only on
/// `m4`/`m7`. An unsatisfiable double request degrades to single.
pub fn derive_fpu(core: &str, policy: FloatPolicy) -> FpuKind {
    let core = core.to_ascii_lowercase();
    let has_fpu = ["m33", "m4", "m7"].iter().any(|s| core.ends_with(s));
    let has_double = ["m4", "m7"].iter().any(|s| core.ends_with(s));
    match policy {
        FloatPolicy::None => FpuKind::None,
        FloatPolicy::Single if has_fpu => FpuKind::Single,
        FloatPolicy::Single => FpuKind::None,
        FloatPolicy::Double if has_double => FpuKind::Double,
        FloatPolicy::Double if has_fpu => {
            log::warn!("core '{core}' has no double-precision FPU, using single");
            FpuKind::Single
        }
        FloatPolicy::Double => FpuKind::None,
    }
}

/// AC5-style single CPU token, e.g. `Cortex-M4.fp.sp`.
fn ac5_cpu_token(core: &str, fpu: FpuKind) -> String {
    let lower = core.to_ascii_lowercase();
    // armcc spells the core as "Cortex-M4", not "cortex-m4".
    let token = match lower.strip_prefix("cortex-") {
        Some(rest) => format!("Cortex-{}", rest.to_ascii_uppercase()),
        None => lower.to_ascii_uppercase(),
    };
    match fpu {
        FpuKind::None => token,
        FpuKind::Single => format!("{token}.fp.sp"),
        FpuKind::Double => format!("{token}.fp.dp"),
    }
}

fn apply_cpu_fpu(id: ToolchainId, core: &str, policy: FloatPolicy, options: &mut CompileOptionSet) {
    let fpu = derive_fpu(core, policy);
    match id {
        ToolchainId::Ac5 => {
            options.set(CATEGORY_GLOBAL, "$cpu", ac5_cpu_token(core, fpu));
        }
        ToolchainId::Ac6 | ToolchainId::ArmGcc => {
            options.set(CATEGORY_GLOBAL, "$cpu", core.to_ascii_lowercase());
            options.set(CATEGORY_GLOBAL, "$fpu", fpu.suffix());
        }
        // Non-ARM toolchains never reach here.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::options::CATEGORY_C_CPP;
    use crate::descriptor::ToolchainDescriptor;

    fn pre_handle_with(
        id: ToolchainId,
        kind: ProjectKind,
        core: Option<&str>,
        policy: FloatPolicy,
        options: &mut CompileOptionSet,
    ) -> Vec<String> {
        let descriptor = ToolchainDescriptor::new(id);
        let mut defines = Vec::new();
        let mut ctx = PreHandleContext {
            kind,
            core,
            float_policy: policy,
            defines: &mut defines,
        };
        pre_handle(&descriptor, &mut ctx, options);
        defines
    }

    #[test]
    fn ac5_lib_format_sets_linker_use_token() {
        let mut options = crate::defaults::default_options(ToolchainId::Ac5);
        options.set(CATEGORY_LINKER, "output-format", "lib");
        let before_c = options.category(CATEGORY_C_CPP).cloned();

        pre_handle_with(
            ToolchainId::Ac5,
            ProjectKind::Arm,
            None,
            FloatPolicy::None,
            &mut options,
        );

        assert_eq!(
            options.get(CATEGORY_LINKER, "$use").and_then(|v| v.as_text()),
            Some("linker-lib")
        );
        // No other output-format side effects.
        assert_eq!(
            options
                .get(CATEGORY_LINKER, "output-format")
                .and_then(|v| v.as_text()),
            Some("lib")
        );
        assert_eq!(options.category(CATEGORY_C_CPP).cloned(), before_c);
    }

    #[test]
    fn elf_format_leaves_use_unset() {
        let mut options = crate::defaults::default_options(ToolchainId::Ac5);
        pre_handle_with(
            ToolchainId::Ac5,
            ProjectKind::Arm,
            None,
            FloatPolicy::None,
            &mut options,
        );
        assert!(options.get(CATEGORY_LINKER, "$use").is_none());
    }

    #[test]
    fn sdcc_lib_format_uses_archiver_token() {
        let mut options = crate::defaults::default_options(ToolchainId::Sdcc);
        options.set(CATEGORY_LINKER, "output-format", "lib");
        pre_handle_with(
            ToolchainId::Sdcc,
            ProjectKind::C51,
            None,
            FloatPolicy::None,
            &mut options,
        );
        assert_eq!(
            options.get(CATEGORY_LINKER, "$use").and_then(|v| v.as_text()),
            Some("sdar")
        );
    }

    #[test]
    fn fpu_suffix_rules() {
        assert_eq!(derive_fpu("cortex-m3", FloatPolicy::Single), FpuKind::None);
        assert_eq!(derive_fpu("cortex-m33", FloatPolicy::Single), FpuKind::Single);
        assert_eq!(derive_fpu("cortex-m4", FloatPolicy::Single), FpuKind::Single);
        assert_eq!(derive_fpu("cortex-m7", FloatPolicy::Double), FpuKind::Double);
        assert_eq!(derive_fpu("cortex-m4", FloatPolicy::Double), FpuKind::Double);
        // Double on m33 degrades to single.
        assert_eq!(derive_fpu("cortex-m33", FloatPolicy::Double), FpuKind::Single);
        assert_eq!(derive_fpu("cortex-m0", FloatPolicy::Double), FpuKind::None);
    }

    #[test]
    fn ac5_cpu_token_shapes() {
        assert_eq!(ac5_cpu_token("cortex-m3", FpuKind::None), "Cortex-M3");
        assert_eq!(ac5_cpu_token("cortex-m4", FpuKind::Single), "Cortex-M4.fp.sp");
        assert_eq!(ac5_cpu_token("cortex-m7", FpuKind::Double), "Cortex-M7.fp.dp");
    }

    #[test]
    fn ac6_derives_cpu_and_fpu_keys() {
        let mut options = crate::defaults::default_options(ToolchainId::Ac6);
        pre_handle_with(
            ToolchainId::Ac6,
            ProjectKind::Arm,
            Some("Cortex-M4"),
            FloatPolicy::Single,
            &mut options,
        );
        assert_eq!(
            options.get(CATEGORY_GLOBAL, "$cpu").and_then(|v| v.as_text()),
            Some("cortex-m4")
        );
        assert_eq!(
            options.get(CATEGORY_GLOBAL, "$fpu").and_then(|v| v.as_text()),
            Some("sp")
        );
    }

    #[test]
    fn intrinsic_macros_are_appended_once() {
        let mut options = crate::defaults::default_options(ToolchainId::Keil51);
        let descriptor = ToolchainDescriptor::new(ToolchainId::Keil51);
        let mut defines = vec!["USER=1".to_string(), "__C51__".to_string()];
        let mut ctx = PreHandleContext {
            kind: ProjectKind::C51,
            core: None,
            float_policy: FloatPolicy::None,
            defines: &mut defines,
        };
        pre_handle(&descriptor, &mut ctx, &mut options);
        // Seed macro already present: not duplicated.
        assert_eq!(defines.iter().filter(|d| *d == "__C51__").count(), 1);
        assert_eq!(defines[0], "USER=1");
    }
}
