//! ARM linker scatter-description generation.
//!
//! Converts the fixed-slot RAM/ROM table into a scatter file: one load
//! region for the startup ROM slot carrying the reset placement and every
//! selected RAM slot, then one load region per remaining selected ROM
//! slot. Region names derive from the slot tag and index (`LR_IROM1`,
//! `ER_ROM2`, `RW_RAM1`).

use flint_core::memory::{canonical_hex, MemoryLayout, MemoryRegion};

use crate::error::{BuildError, Result};

/// Banner emitted at the top of every generated scatter file.
pub const SCATTER_HEADER: &str = "\
; *** Scatter-Loading Description File generated by flint ***
; Edits are discarded: the file is regenerated from the project
; memory table before every build.
";

/// Render the scatter description for a memory table.
pub fn render(layout: &MemoryLayout) -> Result<String> {
    let startup = startup_region(layout)?;

    let mut lines: Vec<String> = Vec::new();
    let start = canonical_hex(&startup.start)?;
    let size = canonical_hex(&startup.size)?;
    let tag = startup.slot_name();

    lines.push(format!("LR_{tag} {start} {size} {{"));
    lines.push(format!("ER_{tag} {start} {size} {{"));
    lines.push("*.o (RESET, +First)".to_string());
    lines.push("*(InRoot$$Sections)".to_string());
    lines.push(".ANY (+RO)".to_string());
    lines.push("}".to_string());
    for ram in layout.selected_rams() {
        let start = canonical_hex(&ram.start)?;
        let size = canonical_hex(&ram.size)?;
        let attr = if ram.no_init { " UNINIT" } else { "" };
        lines.push(format!("RW_{} {start} {size}{attr} {{", ram.slot_name()));
        lines.push(".ANY (+RW +ZI)".to_string());
        lines.push("}".to_string());
    }
    lines.push("}".to_string());

    for rom in layout.selected_roms().filter(|r| !r.is_startup) {
        let start = canonical_hex(&rom.start)?;
        let size = canonical_hex(&rom.size)?;
        let tag = rom.slot_name();
        lines.push(format!("LR_{tag} {start} {size} {{"));
        lines.push(format!("ER_{tag} {start} {size} {{"));
        lines.push(".ANY (+RO)".to_string());
        lines.push("}".to_string());
        lines.push("}".to_string());
    }

    let mut out = String::from(SCATTER_HEADER);
    out.push('\n');
    out.push_str(&indent_by_braces(&lines));
    Ok(out)
}

/// The single selected startup ROM slot, or why there is none.
fn startup_region(layout: &MemoryLayout) -> Result<&MemoryRegion> {
    let marked: Vec<&MemoryRegion> = layout.rom.iter().filter(|r| r.is_startup).collect();
    match marked.as_slice() {
        [] => Err(BuildError::InvalidMemoryLayout {
            detail: "no ROM slot is marked as the startup region".to_string(),
        }),
        [only] if !only.selected => Err(BuildError::InvalidMemoryLayout {
            detail: format!(
                "startup ROM slot {} is not selected",
                only.slot_name()
            ),
        }),
        [only] => Ok(only),
        many => Err(BuildError::InvalidMemoryLayout {
            detail: format!("{} ROM slots are marked as the startup region", many.len()),
        }),
    }
}

/// Indent lines by the running open/close brace balance.
fn indent_by_braces(lines: &[String]) -> String {
    let mut out = String::new();
    let mut depth: i32 = 0;
    for line in lines {
        let opens = line.matches('{').count() as i32;
        let closes = line.matches('}').count() as i32;
        let print_depth = (depth + (opens - closes).min(0)).max(0);
        for _ in 0..print_depth {
            out.push_str("  ");
        }
        out.push_str(line);
        out.push('\n');
        depth += opens - closes;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::memory::MemoryLayout;

    fn layout_with_startup() -> MemoryLayout {
        let mut layout = MemoryLayout::empty();
        {
            let rom = layout.rom_slot_mut(3).unwrap();
            rom.selected = true;
            rom.is_startup = true;
            rom.start = "0x08000000".to_string();
            rom.size = "0x00020000".to_string();
        }
        {
            let ram = layout.ram_slot_mut(1).unwrap();
            ram.selected = true;
            ram.start = "0x20000000".to_string();
            ram.size = "0x00008000".to_string();
        }
        layout
    }

    #[test]
    fn startup_slot_three_produces_single_load_region() {
        let text = render(&layout_with_startup()).unwrap();
        assert!(text.starts_with("; *** Scatter-Loading"));
        assert!(text.contains("LR_ROM3 0x08000000 0x00020000 {"));
        assert!(text.contains("ER_ROM3 0x08000000 0x00020000 {"));
        assert!(text.contains("RW_RAM1 0x20000000 0x00008000 {"));
        assert!(!text.contains("UNINIT"));
        assert_eq!(text.matches("LR_").count(), 1);
        // One RAM child per selected RAM slot.
        assert_eq!(text.matches("RW_").count(), 1);
    }

    #[test]
    fn no_init_ram_carries_uninit_attribute() {
        let mut layout = layout_with_startup();
        {
            let ram = layout.ram_slot_mut(4).unwrap();
            ram.selected = true;
            ram.no_init = true;
            ram.start = "0x10000000".to_string();
            ram.size = "0x00004000".to_string();
        }
        let text = render(&layout).unwrap();
        assert!(text.contains("RW_IRAM1 0x10000000 0x00004000 UNINIT {"));
    }

    #[test]
    fn secondary_roms_get_read_only_regions() {
        let mut layout = layout_with_startup();
        {
            let rom = layout.rom_slot_mut(4).unwrap();
            rom.selected = true;
            rom.start = "0x08100000".to_string();
            rom.size = "0x00010000".to_string();
        }
        let text = render(&layout).unwrap();
        assert!(text.contains("LR_IROM1 0x08100000 0x00010000 {"));
        assert_eq!(text.matches("LR_").count(), 2);
        // Secondary region holds read-only placement only.
        assert_eq!(text.matches("*.o (RESET, +First)").count(), 1);
    }

    #[test]
    fn zero_startup_marks_fail() {
        let mut layout = layout_with_startup();
        layout.rom_slot_mut(3).unwrap().is_startup = false;
        let err = render(&layout).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMemoryLayout { .. }));
    }

    #[test]
    fn multiple_startup_marks_fail() {
        let mut layout = layout_with_startup();
        {
            let rom = layout.rom_slot_mut(1).unwrap();
            rom.selected = true;
            rom.is_startup = true;
        }
        let err = render(&layout).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMemoryLayout { .. }));
    }

    #[test]
    fn unselected_startup_fails() {
        let mut layout = layout_with_startup();
        layout.rom_slot_mut(3).unwrap().selected = false;
        let err = render(&layout).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMemoryLayout { .. }));
    }

    #[test]
    fn addresses_are_normalized_to_ten_chars() {
        let mut layout = layout_with_startup();
        layout.rom_slot_mut(3).unwrap().start = "0x8000000".to_string();
        let text = render(&layout).unwrap();
        assert!(text.contains("LR_ROM3 0x08000000"));
    }

    #[test]
    fn indentation_tracks_brace_depth() {
        let text = render(&layout_with_startup()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let er = lines
            .iter()
            .find(|l| l.trim_start().starts_with("ER_ROM3"))
            .unwrap();
        assert!(er.starts_with("  ER_ROM3"));
        let any_ro = lines
            .iter()
            .find(|l| l.trim_start().starts_with(".ANY (+RO)"))
            .unwrap();
        assert!(any_ro.starts_with("    .ANY"));
    }
}
