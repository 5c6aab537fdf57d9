//! Property-description resources: the valid key set per option category.
//!
//! One embedded JSON resource per toolchain lists every key the current
//! schema recognizes. Migration uses these tables only to prune unknown
//! keys; they carry no values.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::descriptor::ToolchainId;

/// The recognized key set per category for one toolchain.
#[derive(Debug)]
pub struct PropertyTable {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl PropertyTable {
    fn parse(raw: &str) -> Self {
        let categories: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(raw)
            .expect("embedded property-description resource should be valid JSON");
        PropertyTable { categories }
    }

    /// Whether the schema recognizes `key` inside `category`.
    pub fn allows(&self, category: &str, key: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|keys| keys.contains(key))
    }

    /// The recognized keys of one category.
    pub fn category_keys(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(category)
    }
}

macro_rules! table_for {
    ($cell:ident, $resource:literal) => {{
        static $cell: OnceLock<PropertyTable> = OnceLock::new();
        $cell.get_or_init(|| PropertyTable::parse(include_str!($resource)))
    }};
}

/// The property table for a toolchain, parsed once per process.
pub fn property_table(id: ToolchainId) -> &'static PropertyTable {
    match id {
        ToolchainId::Ac5 => table_for!(AC5, "../resources/ac5.properties.json"),
        ToolchainId::Ac6 => table_for!(AC6, "../resources/ac6.properties.json"),
        ToolchainId::ArmGcc => table_for!(ARM_GCC, "../resources/arm-gcc.properties.json"),
        ToolchainId::RiscvGcc => table_for!(RISCV_GCC, "../resources/riscv-gcc.properties.json"),
        ToolchainId::Keil51 => table_for!(KEIL51, "../resources/keil51.properties.json"),
        ToolchainId::Sdcc => table_for!(SDCC, "../resources/sdcc.properties.json"),
        ToolchainId::IarStm8 => table_for!(IAR_STM8, "../resources/iar-stm8.properties.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_toolchain_has_a_table() {
        for id in ToolchainId::ALL {
            let table = property_table(id);
            assert!(table.category_keys("c/cpp-compiler").is_some());
            assert!(table.category_keys("linker").is_some());
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let table = property_table(ToolchainId::Ac5);
        assert!(table.allows("c/cpp-compiler", "optimization"));
        assert!(!table.allows("c/cpp-compiler", "gnu-extensions"));
        assert!(!table.allows("linker", "output-lib"));
        assert!(!table.allows("no-such-category", "optimization"));
    }
}
