//! The builder-params artifact.
//!
//! One `BuilderParams` is created fresh per build, persisted next to the
//! build output, compared against the previous persisted instance to
//! decide rebuild necessity, then superseded. The previous copy is
//! rotated to the `.old` suffix before each write; both files stay
//! independently parseable JSON documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use flint_core::options::CompileOptionSet;

use crate::error::Result;

/// File name of the build request artifact.
pub const PARAMS_FILE_NAME: &str = "builder.params";
/// File name of the rotated previous artifact.
pub const PARAMS_OLD_FILE_NAME: &str = "builder.params.old";

/// Whether the external builder may reuse prior objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Rebuild everything.
    Full,
    /// Recompile only what changed.
    Incremental,
}

/// A fully-resolved build request for the external builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuilderParams {
    /// Project name; names the build outputs.
    pub name: String,
    /// Toolchain name.
    pub toolchain: String,
    /// Toolchain installation root.
    pub toolchain_dir: String,
    /// Rebuild decision for this request.
    pub mode: BuildMode,
    /// Ordered, de-duplicated, sorted source list (project-root-relative).
    pub sources: Vec<String>,
    /// Per-source extra compiler flags. An empty string means "explicitly
    /// cleared" and still forces recompilation of that source.
    pub file_options: BTreeMap<String, String>,
    /// Include directories, first-seen order.
    pub include_dirs: Vec<String>,
    /// Library directories, first-seen order.
    pub library_dirs: Vec<String>,
    /// Macro definitions, first-seen order.
    pub defines: Vec<String>,
    /// Headers force-included into every translation unit.
    #[serde(default)]
    pub force_includes: Vec<String>,
    /// Total selected RAM budget in bytes (ARM targets).
    pub ram_bytes: Option<u64>,
    /// Total selected ROM budget in bytes (ARM targets).
    pub rom_bytes: Option<u64>,
    /// Per-category content hashes of the option subsets.
    pub sha: BTreeMap<String, String>,
    /// Environment variable overrides for the builder process.
    pub env: BTreeMap<String, String>,
    /// The pre-handled option set the request was shaped from.
    pub options: CompileOptionSet,
}

/// Path of the current artifact inside an output directory.
pub fn params_path(out_dir: &Path) -> PathBuf {
    out_dir.join(PARAMS_FILE_NAME)
}

/// Persist a build request, rotating any existing artifact to `.old`.
pub fn write_params(out_dir: &Path, params: &BuilderParams) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let current = params_path(out_dir);
    if current.is_file() {
        std::fs::rename(&current, out_dir.join(PARAMS_OLD_FILE_NAME))?;
    }
    std::fs::write(&current, serde_json::to_string_pretty(params)?)?;
    Ok(current)
}

/// Load the previous build's request, if one survives.
///
/// Before rotation the previous build's artifact is the current file;
/// after rotation it is the `.old` copy. Either may serve as the hash
/// baseline. Unparseable artifacts are treated as absent (forcing a full
/// build) rather than failing the compile.
pub fn load_previous(out_dir: &Path) -> Option<BuilderParams> {
    for name in [PARAMS_FILE_NAME, PARAMS_OLD_FILE_NAME] {
        let path = out_dir.join(name);
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        match serde_json::from_str(&text) {
            Ok(params) => return Some(params),
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
            }
        }
    }
    None
}
