//! Built-in default option sets per toolchain.
//!
//! Every key set here must also appear in the matching property-description
//! resource, since migration back-fills user files from these templates
//! after pruning unknown keys.

use flint_core::options::{
    CompileOptionSet, CATEGORY_ASM, CATEGORY_C_CPP, CATEGORY_GLOBAL, CATEGORY_LINKER,
};

use crate::descriptor::ToolchainId;

/// A fresh default option set for the given toolchain, stamped with its
/// current schema version. Always a new instance, never shared state.
pub fn default_options(id: ToolchainId) -> CompileOptionSet {
    let mut opts = CompileOptionSet::new(id.schema_version());
    match id {
        ToolchainId::Ac5 => {
            opts.set(CATEGORY_GLOBAL, "use-microlib", false);
            opts.set(CATEGORY_GLOBAL, "output-debug-info", true);
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "optimization", "level-0");
            opts.set(CATEGORY_C_CPP, "language-c", "c99");
            opts.set(CATEGORY_C_CPP, "one-elf-section-per-function", true);
            opts.set(CATEGORY_C_CPP, "warnings", "all-warnings");
            opts.set(CATEGORY_C_CPP, "disable-warnings", "");
            opts.set(CATEGORY_C_CPP, "plain-char-is-signed", false);
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "elf");
            opts.set(CATEGORY_LINKER, "scatter-file", "");
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::Ac6 => {
            opts.set(CATEGORY_GLOBAL, "use-microlib", false);
            opts.set(CATEGORY_GLOBAL, "output-debug-info", true);
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "optimization", "level-0");
            opts.set(CATEGORY_C_CPP, "language-c", "c99");
            opts.set(CATEGORY_C_CPP, "language-cpp", "c++11");
            opts.set(CATEGORY_C_CPP, "one-elf-section-per-function", true);
            opts.set(CATEGORY_C_CPP, "warnings", "all-warnings");
            opts.set(CATEGORY_C_CPP, "disable-warnings", "");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "elf");
            opts.set(CATEGORY_LINKER, "scatter-file", "");
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::ArmGcc => {
            opts.set(CATEGORY_GLOBAL, "output-debug-info", true);
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "optimization", "level-0");
            opts.set(CATEGORY_C_CPP, "language-c", "c11");
            opts.set(CATEGORY_C_CPP, "language-cpp", "c++14");
            opts.set(CATEGORY_C_CPP, "one-elf-section-per-function", true);
            opts.set(CATEGORY_C_CPP, "warnings", "all-warnings");
            opts.set(CATEGORY_C_CPP, "disable-warnings", "");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "elf");
            opts.set(CATEGORY_LINKER, "linker-script", "");
            opts.set(CATEGORY_LINKER, "remove-unused-input-sections", true);
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::RiscvGcc => {
            opts.set(CATEGORY_GLOBAL, "arch", "rv32imac");
            opts.set(CATEGORY_GLOBAL, "abi", "ilp32");
            opts.set(CATEGORY_GLOBAL, "code-model", "medlow");
            opts.set(CATEGORY_GLOBAL, "output-debug-info", true);
            opts.set(CATEGORY_C_CPP, "optimization", "level-0");
            opts.set(CATEGORY_C_CPP, "language-c", "c11");
            opts.set(CATEGORY_C_CPP, "warnings", "all-warnings");
            opts.set(CATEGORY_C_CPP, "disable-warnings", "");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "elf");
            opts.set(CATEGORY_LINKER, "linker-script", "");
            opts.set(CATEGORY_LINKER, "remove-unused-input-sections", true);
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::Keil51 => {
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "memory-model", "small");
            opts.set(CATEGORY_C_CPP, "optimization", "speed");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "omf");
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::Sdcc => {
            opts.set(CATEGORY_GLOBAL, "device", "mcs51");
            opts.set(CATEGORY_GLOBAL, "stack-auto", false);
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "memory-model", "small");
            opts.set(CATEGORY_C_CPP, "optimization", "balanced");
            opts.set(CATEGORY_C_CPP, "language-c", "c99");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "hex");
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
        ToolchainId::IarStm8 => {
            opts.set(CATEGORY_GLOBAL, "code-model", "small");
            opts.set(CATEGORY_GLOBAL, "data-model", "medium");
            opts.set(CATEGORY_GLOBAL, "misc-control", "");
            opts.set(CATEGORY_C_CPP, "optimization", "none");
            opts.set(CATEGORY_C_CPP, "misc-controls", "");
            opts.set(CATEGORY_ASM, "misc-controls", "");
            opts.set(CATEGORY_LINKER, "output-format", "elf");
            opts.set(CATEGORY_LINKER, "icf-file", "");
            opts.set(CATEGORY_LINKER, "misc-controls", "");
        }
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn defaults_are_fresh_instances() {
        let a = default_options(ToolchainId::Ac5);
        let mut b = default_options(ToolchainId::Ac5);
        b.set(CATEGORY_LINKER, "output-format", "lib");
        // Mutating one hand-out must not leak into the next.
        assert_ne!(a, b);
        assert_eq!(a, default_options(ToolchainId::Ac5));
    }

    #[test]
    fn defaults_are_stamped_with_schema_version() {
        for id in ToolchainId::ALL {
            assert_eq!(default_options(id).version, id.schema_version());
        }
    }

    #[test]
    fn every_default_key_is_schema_approved() {
        for id in ToolchainId::ALL {
            let table = schema::property_table(id);
            let defaults = default_options(id);
            for (category, entries) in &defaults.categories {
                for key in entries.keys() {
                    assert!(
                        table.allows(category, key),
                        "{}: default key {category}/{key} missing from property table",
                        id.name()
                    );
                }
            }
        }
    }
}
