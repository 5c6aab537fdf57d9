//! Process-scoped toolchain registry.
//!
//! Descriptors are constructed once per toolchain per process and cached;
//! [`invalidate`] is the explicit reset hook for settings changes (it also
//! drops probe results, so the next request re-reads env vars and re-runs
//! discovery).

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use flint_core::project::ProjectKind;

use crate::descriptor::{ToolchainDescriptor, ToolchainId};
use crate::error::{Result, ToolchainError};
use crate::probe;

fn cache() -> &'static Mutex<HashMap<ToolchainId, ToolchainDescriptor>> {
    static CACHE: OnceLock<Mutex<HashMap<ToolchainId, ToolchainDescriptor>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The cached descriptor for a toolchain identity.
pub fn descriptor(id: ToolchainId) -> ToolchainDescriptor {
    let mut map = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.entry(id).or_insert_with(|| ToolchainDescriptor::new(id)).clone()
}

/// Strict resolution: fails with [`ToolchainError::UnknownToolchain`] when
/// the name is not in the allow-list for the project family.
pub fn lookup(kind: ProjectKind, name: &str) -> Result<ToolchainDescriptor> {
    let (allowed, _) = ToolchainId::family(kind);
    let id = ToolchainId::from_name(name)
        .filter(|id| allowed.contains(id))
        .ok_or_else(|| ToolchainError::UnknownToolchain {
            name: name.to_string(),
        })?;
    Ok(descriptor(id))
}

/// Resolve a toolchain name for a project family, falling back to the
/// family default (with a surfaced warning) when the name is unknown.
pub fn resolve(kind: ProjectKind, name: &str) -> ToolchainDescriptor {
    match lookup(kind, name) {
        Ok(desc) => desc,
        Err(_) => {
            let (_, default) = ToolchainId::family(kind);
            log::warn!(
                "unknown toolchain '{name}' for {kind:?} project, falling back to {}",
                default.name()
            );
            descriptor(default)
        }
    }
}

/// Drop every cached descriptor and probe result.
pub fn invalidate() {
    cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clear();
    probe::invalidate();
}
