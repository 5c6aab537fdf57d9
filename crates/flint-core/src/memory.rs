//! Fixed-slot RAM/ROM memory tables.
//!
//! ARM-family projects describe their memory layout through a fixed table
//! of 5 ROM-family and 5 RAM-family slots. Slots 1..=3 of each family use
//! the off-chip tag (`ROM`/`RAM`); slots 4..=5 use the on-chip tag
//! (`IROM`/`IRAM`) with the index re-based from 1. Addresses and sizes are
//! carried as canonical 10-character hex literals so comparisons and
//! round-trips are textual, not numeric.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Memory slot family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryTag {
    /// Off-chip read-only memory.
    Rom,
    /// On-chip read-only memory.
    Irom,
    /// Off-chip read-write memory.
    Ram,
    /// On-chip read-write memory.
    Iram,
}

impl MemoryTag {
    /// Whether this tag belongs to the ROM family.
    pub fn is_rom_family(self) -> bool {
        matches!(self, MemoryTag::Rom | MemoryTag::Irom)
    }

    /// The upper-case label used in slot names and scatter regions.
    pub fn label(self) -> &'static str {
        match self {
            MemoryTag::Rom => "ROM",
            MemoryTag::Irom => "IROM",
            MemoryTag::Ram => "RAM",
            MemoryTag::Iram => "IRAM",
        }
    }
}

/// One slot of the fixed memory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryRegion {
    /// Slot family tag.
    pub tag: MemoryTag,
    /// 1-based slot id within the tag.
    pub slot: u32,
    /// Start address, canonical hex.
    pub start: String,
    /// Size in bytes, canonical hex.
    pub size: String,
    /// Whether the slot participates in the build.
    pub selected: bool,
    /// RAM family: skip zero-initialization for this slot.
    #[serde(default)]
    pub no_init: bool,
    /// ROM family: this slot holds the reset/entry vector.
    #[serde(default)]
    pub is_startup: bool,
}

impl MemoryRegion {
    /// An empty, unselected slot.
    pub fn empty(tag: MemoryTag, slot: u32) -> Self {
        MemoryRegion {
            tag,
            slot,
            start: canonical_hex_u64(0),
            size: canonical_hex_u64(0),
            selected: false,
            no_init: false,
            is_startup: false,
        }
    }

    /// Slot name, e.g. `ROM1` or `IRAM2`.
    pub fn slot_name(&self) -> String {
        format!("{}{}", self.tag.label(), self.slot)
    }

    /// Numeric start address.
    pub fn start_value(&self) -> Result<u64> {
        parse_address(&self.start)
    }

    /// Numeric size in bytes.
    pub fn size_value(&self) -> Result<u64> {
        parse_address(&self.size)
    }
}

/// Parse a hex (`0x`-prefixed) or decimal address/size literal.
pub fn parse_address(input: &str) -> Result<u64> {
    let text = input.trim();
    let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        text.parse::<u64>()
    };
    value.map_err(|_| CoreError::BadAddress {
        value: input.to_string(),
    })
}

/// Canonicalize an address/size literal to a 10-character hex form.
pub fn canonical_hex(input: &str) -> Result<String> {
    Ok(canonical_hex_u64(parse_address(input)?))
}

/// Format a 32-bit value as a 10-character, left-zero-padded hex literal.
pub fn canonical_hex_u64(value: u64) -> String {
    format!("0x{value:08X}")
}

/// The fixed 5 ROM + 5 RAM slot table of one ARM project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    /// ROM-family slots: ROM1..3, IROM1..2.
    pub rom: Vec<MemoryRegion>,
    /// RAM-family slots: RAM1..3, IRAM1..2.
    pub ram: Vec<MemoryRegion>,
}

/// Number of slots per memory family.
pub const SLOTS_PER_FAMILY: u32 = 5;

/// Slots carrying the off-chip tag before the on-chip tag takes over.
pub const OFF_CHIP_SLOTS: u32 = 3;

fn family_slots(off_chip: MemoryTag, on_chip: MemoryTag) -> Vec<MemoryRegion> {
    (1..=SLOTS_PER_FAMILY)
        .map(|i| {
            if i <= OFF_CHIP_SLOTS {
                MemoryRegion::empty(off_chip, i)
            } else {
                MemoryRegion::empty(on_chip, i - OFF_CHIP_SLOTS)
            }
        })
        .collect()
}

impl MemoryLayout {
    /// An all-empty table with every slot unselected.
    pub fn empty() -> Self {
        MemoryLayout {
            rom: family_slots(MemoryTag::Rom, MemoryTag::Irom),
            ram: family_slots(MemoryTag::Ram, MemoryTag::Iram),
        }
    }

    /// ROM-family slot by 1-based table index (1..=5).
    pub fn rom_slot(&self, index: u32) -> Result<&MemoryRegion> {
        self.rom
            .get(index.wrapping_sub(1) as usize)
            .ok_or(CoreError::BadSlot { index })
    }

    /// Mutable ROM-family slot by 1-based table index.
    pub fn rom_slot_mut(&mut self, index: u32) -> Result<&mut MemoryRegion> {
        self.rom
            .get_mut(index.wrapping_sub(1) as usize)
            .ok_or(CoreError::BadSlot { index })
    }

    /// RAM-family slot by 1-based table index (1..=5).
    pub fn ram_slot(&self, index: u32) -> Result<&MemoryRegion> {
        self.ram
            .get(index.wrapping_sub(1) as usize)
            .ok_or(CoreError::BadSlot { index })
    }

    /// Mutable RAM-family slot by 1-based table index.
    pub fn ram_slot_mut(&mut self, index: u32) -> Result<&mut MemoryRegion> {
        self.ram
            .get_mut(index.wrapping_sub(1) as usize)
            .ok_or(CoreError::BadSlot { index })
    }

    /// Selected ROM-family slots in table order.
    pub fn selected_roms(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.rom.iter().filter(|r| r.selected)
    }

    /// Selected RAM-family slots in table order.
    pub fn selected_rams(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.ram.iter().filter(|r| r.selected)
    }

    /// Sum of selected ROM slot sizes in bytes.
    pub fn rom_total_bytes(&self) -> Result<u64> {
        self.selected_roms().map(|r| r.size_value()).sum()
    }

    /// Sum of selected RAM slot sizes in bytes.
    pub fn ram_total_bytes(&self) -> Result<u64> {
        self.selected_rams().map(|r| r.size_value()).sum()
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        MemoryLayout::empty()
    }
}
