//! Build request compilation.
//!
//! Turns one project's state into a [`BuilderParams`] request: collects
//! enabled sources, resolves per-file extra options, aggregates include
//! and define lists, computes memory budgets, applies toolchain option
//! shaping, and decides full vs. incremental mode by comparing option
//! hashes against the previous persisted request.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use flint_core::hash::content_hash_hex;
use flint_core::memory::parse_address;
use flint_core::options::{
    CompileOptionSet, OptionCategory, CATEGORY_ASM, CATEGORY_C_CPP, CATEGORY_GLOBAL,
    CATEGORY_LINKER,
};
use flint_core::project::{dedup_first_seen, source_kind, PatternOption, Project, ProjectKind};
use flint_toolchain::descriptor::ToolchainId;
use flint_toolchain::prehandle::PreHandleContext;
use flint_toolchain::registry;

use crate::error::{BuildError, Result};
use crate::params::{BuildMode, BuilderParams};
use crate::scatter;

/// Hash-map keys whose mismatch against the previous build forces a full
/// rebuild.
pub const REBUILD_HASH_KEYS: [&str; 4] = [
    CATEGORY_GLOBAL,
    "c/cpp-defines",
    CATEGORY_C_CPP,
    CATEGORY_ASM,
];

/// Env override for the ROM budget, honored when no memory table exists.
pub const ENV_ROM_SIZE: &str = "FLINT_ROM_SIZE";
/// Env override for the RAM budget, honored when no memory table exists.
pub const ENV_RAM_SIZE: &str = "FLINT_RAM_SIZE";

/// Compile one build request.
///
/// `options` is the migrated option set for the active toolchain;
/// `previous` is the last persisted request, used as the hash baseline.
/// Fails with [`BuildError::ToolchainNotReady`] before any other work
/// when the resolved toolchain installation is absent.
pub fn compile(
    project: &Project,
    root: &Path,
    mut options: CompileOptionSet,
    previous: Option<&BuilderParams>,
) -> Result<BuilderParams> {
    let descriptor = registry::resolve(project.kind, &project.toolchain);
    if !descriptor.is_ready() {
        return Err(BuildError::ToolchainNotReady {
            name: descriptor.id.name().to_string(),
            detail: format!("compiler not found at {}", descriptor.exe_path().display()),
        });
    }

    // 1. Enabled sources from enabled groups, allow-listed by extension.
    let (sources, match_paths) = collect_sources(project);

    // 2. Per-file extra options from the pattern table.
    let file_options = resolve_file_options(project, &sources, &match_paths, previous);

    // 3. Include/library/define aggregation, first-seen order.
    let include_dirs = dedup_first_seen(
        project.include_dirs.iter().cloned().chain(
            descriptor
                .system_include_dirs()
                .iter()
                .map(|p| p.display().to_string()),
        ),
    );
    let library_dirs = dedup_first_seen(
        project.library_dirs.iter().cloned().chain(
            descriptor
                .library_dirs()
                .iter()
                .map(|p| p.display().to_string()),
        ),
    );
    let mut defines = dedup_first_seen(project.defines.iter().cloned());

    // 4. Memory budgets (ARM only); env overrides fill gaps, never win
    //    over a computed value.
    let (rom_bytes, ram_bytes) = memory_budgets(project)?;

    // 5. Toolchain option shaping.
    {
        let mut ctx = PreHandleContext {
            kind: project.kind,
            core: project.device.core.as_deref(),
            float_policy: project.float_policy,
            defines: &mut defines,
        };
        descriptor.pre_handle_options(&mut ctx, &mut options);
    }
    shape_for_target(project, root, descriptor.id, &mut options)?;

    // 6. Per-category hashes and the rebuild decision.
    let mut sha = BTreeMap::new();
    sha.insert(
        CATEGORY_GLOBAL.to_string(),
        content_hash_hex(&category_snapshot(&options, CATEGORY_GLOBAL)),
    );
    sha.insert("c/cpp-defines".to_string(), content_hash_hex(&defines));
    sha.insert(
        CATEGORY_C_CPP.to_string(),
        content_hash_hex(&category_snapshot(&options, CATEGORY_C_CPP)),
    );
    sha.insert(
        CATEGORY_ASM.to_string(),
        content_hash_hex(&category_snapshot(&options, CATEGORY_ASM)),
    );
    sha.insert(
        CATEGORY_LINKER.to_string(),
        content_hash_hex(&category_snapshot(&options, CATEGORY_LINKER)),
    );
    let mode = decide_mode(descriptor.id, &sha, previous);

    Ok(BuilderParams {
        name: project.name.clone(),
        toolchain: descriptor.id.name().to_string(),
        toolchain_dir: descriptor.root_dir().display().to_string(),
        mode,
        sources,
        file_options,
        include_dirs,
        library_dirs,
        defines,
        force_includes: descriptor
            .force_include_headers()
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        ram_bytes,
        rom_bytes,
        sha,
        env: project.env.clone(),
        options,
    })
}

fn collect_sources(project: &Project) -> (Vec<String>, BTreeMap<String, String>) {
    let mut sources = Vec::new();
    let mut match_paths = BTreeMap::new();
    for group in &project.groups {
        if !group.enabled {
            continue;
        }
        for file in &group.files {
            if !file.enabled || source_kind(&file.path).is_none() {
                continue;
            }
            let match_path = match &file.virtual_path {
                Some(v) => v.clone(),
                None if group.is_virtual => {
                    let file_name = Path::new(&file.path)
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or(&file.path);
                    format!("{}/{}", group.name, file_name)
                }
                None => file.path.clone(),
            };
            match_paths.insert(file.path.clone(), match_path);
            sources.push(file.path.clone());
        }
    }
    sources.sort();
    sources.dedup();
    (sources, match_paths)
}

fn resolve_file_options(
    project: &Project,
    sources: &[String],
    match_paths: &BTreeMap<String, String>,
    previous: Option<&BuilderParams>,
) -> BTreeMap<String, String> {
    let mut file_options = BTreeMap::new();
    for source in sources {
        let match_path = match_paths.get(source).unwrap_or(source);
        // A fault inside matching downgrades to "no extra options"; it
        // must never abort the whole compile.
        let flags = catch_unwind(AssertUnwindSafe(|| {
            match_flags(&project.file_options, match_path)
        }))
        .unwrap_or_else(|_| {
            log::warn!("file-option matching failed for '{match_path}'");
            None
        });
        match flags {
            Some(flags) => {
                file_options.insert(source.clone(), flags);
            }
            None => {
                // Previously non-empty, now unmatched: keep an explicit
                // cleared entry so the file is recompiled.
                let was_set = previous
                    .map(|p| p.file_options.get(source).is_some_and(|old| !old.is_empty()))
                    .unwrap_or(false);
                if was_set {
                    file_options.insert(source.clone(), String::new());
                }
            }
        }
    }
    file_options
}

/// Concatenate the flags of every pattern matching `path`, in table order.
fn match_flags(table: &[PatternOption], path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for entry in table {
        match glob::Pattern::new(&entry.pattern) {
            Ok(pattern) if pattern.matches(path) => parts.push(entry.flags.as_str()),
            Ok(_) => {}
            Err(e) => log::warn!("bad file-option pattern '{}': {e}", entry.pattern),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" ").trim().to_string())
    }
}

fn memory_budgets(project: &Project) -> Result<(Option<u64>, Option<u64>)> {
    if !matches!(project.kind, ProjectKind::Arm) {
        return Ok((None, None));
    }
    let (mut rom, mut ram) = match &project.memory {
        Some(memory) => (
            Some(memory.rom_total_bytes()?),
            Some(memory.ram_total_bytes()?),
        ),
        None => (None, None),
    };
    if rom.is_none() {
        rom = env_size(project, ENV_ROM_SIZE);
    }
    if ram.is_none() {
        ram = env_size(project, ENV_RAM_SIZE);
    }
    Ok((rom, ram))
}

fn env_size(project: &Project, key: &str) -> Option<u64> {
    let raw = project
        .env
        .get(key)
        .cloned()
        .or_else(|| std::env::var(key).ok())?;
    match parse_address(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("ignoring {key}: {e}");
            None
        }
    }
}

/// Target-builder-specific option shaping after pre-handling.
fn shape_for_target(
    project: &Project,
    root: &Path,
    id: ToolchainId,
    options: &mut CompileOptionSet,
) -> Result<()> {
    match id {
        ToolchainId::Ac5 | ToolchainId::Ac6 => {
            let configured = options
                .get(CATEGORY_LINKER, "scatter-file")
                .and_then(|v| v.as_text())
                .unwrap_or("")
                .trim()
                .to_string();
            if !configured.is_empty() {
                return Ok(());
            }
            let Some(memory) = &project.memory else {
                log::warn!("no scatter file configured and no memory table to generate one");
                return Ok(());
            };
            let text = scatter::render(memory)?;
            let out_dir = root.join(&project.output_dir);
            std::fs::create_dir_all(&out_dir)?;
            let file_name = format!("{}.sct", project.name);
            std::fs::write(out_dir.join(&file_name), text)?;
            options.set(
                CATEGORY_LINKER,
                "scatter-file",
                format!("{}/{}", project.output_dir.trim_end_matches('/'), file_name),
            );
        }
        ToolchainId::ArmGcc | ToolchainId::RiscvGcc => {
            if let Some(raw) = options
                .get(CATEGORY_LINKER, "linker-script")
                .and_then(|v| v.as_text())
            {
                let cleaned = dedup_first_seen(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                )
                .join(",");
                options.set(CATEGORY_LINKER, "linker-script", cleaned);
            }
        }
        ToolchainId::Keil51 => {
            let is_lib = options
                .get(CATEGORY_LINKER, "output-format")
                .and_then(|v| v.as_text())
                == Some("lib");
            if is_lib {
                // The librarian appends into an existing archive; start
                // every library build from an empty one.
                let out_dir = root.join(&project.output_dir);
                std::fs::create_dir_all(&out_dir)?;
                std::fs::write(out_dir.join(format!("{}.LIB", project.name)), b"")?;
            }
        }
        ToolchainId::Sdcc | ToolchainId::IarStm8 => {}
    }
    Ok(())
}

fn category_snapshot(options: &CompileOptionSet, name: &str) -> OptionCategory {
    options.category(name).cloned().unwrap_or_default()
}

fn decide_mode(
    id: ToolchainId,
    sha: &BTreeMap<String, String>,
    previous: Option<&BuilderParams>,
) -> BuildMode {
    // The C51 backend cannot reuse objects reliably; always build full.
    if id == ToolchainId::Keil51 {
        return BuildMode::Full;
    }
    let Some(previous) = previous else {
        return BuildMode::Full;
    };
    let unchanged = REBUILD_HASH_KEYS
        .iter()
        .all(|key| previous.sha.get(*key) == sha.get(*key));
    if unchanged {
        BuildMode::Incremental
    } else {
        BuildMode::Full
    }
}
