//! Compiler installation probing.
//!
//! Intrinsic macros and bundled include directories are discovered by
//! running the real compiler's preprocessor in dump-macros mode and
//! parsing its output. One probe runs per toolchain per process lifetime;
//! the cache map's lock is held across the probe itself, so concurrent
//! requests for the same toolchain are serialized rather than spawning
//! redundant compiler processes. [`invalidate`] clears the cache when the
//! installation configuration changes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, OnceLock};

use crate::descriptor::{ToolchainDescriptor, ToolchainId};

/// Result of probing one toolchain installation.
#[derive(Debug, Default)]
pub struct ProbeResult {
    /// Compiler-intrinsic macro definitions (`NAME` / `NAME=VALUE` /
    /// `NAME(...)=` forms).
    pub macros: Vec<String>,
    /// Include directories confirmed to exist under the installation.
    pub include_dirs: Vec<PathBuf>,
}

fn cache() -> &'static Mutex<HashMap<ToolchainId, Arc<ProbeResult>>> {
    static CACHE: OnceLock<Mutex<HashMap<ToolchainId, Arc<ProbeResult>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Probe a toolchain installation, returning the cached result when the
/// toolchain was probed before in this process.
pub fn probe(descriptor: &ToolchainDescriptor) -> Arc<ProbeResult> {
    let mut map = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(result) = map.get(&descriptor.id) {
        return Arc::clone(result);
    }
    let result = Arc::new(run_probe(descriptor));
    map.insert(descriptor.id, Arc::clone(&result));
    result
}

/// Drop all cached probe results.
pub fn invalidate() {
    cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clear();
}

fn run_probe(descriptor: &ToolchainDescriptor) -> ProbeResult {
    let mut result = ProbeResult {
        macros: seed_macros(descriptor.id),
        include_dirs: descriptor
            .system_include_dirs()
            .into_iter()
            .filter(|d| d.is_dir())
            .collect(),
    };

    let Some(args) = dump_macro_args(descriptor.id) else {
        return result;
    };

    let output = Command::new(descriptor.exe_path())
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            result.macros.extend(parse_macro_dump(&text));
        }
        Ok(out) => {
            log::warn!(
                "{}: macro dump exited with {}; using seed macros only",
                descriptor.id.name(),
                out.status
            );
        }
        Err(e) => {
            log::warn!(
                "{}: cannot run {}: {e}; using seed macros only",
                descriptor.id.name(),
                descriptor.exe_path().display()
            );
        }
    }
    result
}

/// Static macro seeds for toolchains whose compiler has no dump mode.
fn seed_macros(id: ToolchainId) -> Vec<String> {
    match id {
        ToolchainId::Keil51 => vec!["__C51__".to_string()],
        ToolchainId::IarStm8 => vec!["__ICCSTM8__".to_string()],
        _ => Vec::new(),
    }
}

/// Preprocessor arguments that make the compiler dump its macro set, or
/// `None` when the toolchain has no such mode.
fn dump_macro_args(id: ToolchainId) -> Option<&'static [&'static str]> {
    match id {
        ToolchainId::Ac5 => Some(&["--list_macros"]),
        ToolchainId::Ac6 | ToolchainId::ArmGcc | ToolchainId::RiscvGcc => {
            Some(&["-dM", "-E", "-xc", "-"])
        }
        ToolchainId::Sdcc => Some(&["-dM", "-E", "-"]),
        ToolchainId::Keil51 | ToolchainId::IarStm8 => None,
    }
}

/// Parse `#define` lines from a preprocessor macro dump.
///
/// `#define NAME VALUE` becomes `NAME=VALUE`, a bare `#define NAME`
/// becomes `NAME`, and function-like macros become `NAME(...)=` with an
/// empty value.
pub fn parse_macro_dump(text: &str) -> Vec<String> {
    let mut macros = Vec::new();
    for line in text.lines() {
        let Some(rest) = line.trim().strip_prefix("#define ") else {
            continue;
        };
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        // A '(' glued to the name marks a function-like macro.
        let name_end = rest
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            continue;
        }
        if rest[name_end..].starts_with('(') {
            macros.push(format!("{name}(...)="));
            continue;
        }
        let value = rest[name_end..].trim();
        if value.is_empty() {
            macros.push(name.to_string());
        } else {
            macros.push(format!("{name}={value}"));
        }
    }
    macros
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_macros_keep_values() {
        let dump = "#define __VERSION__ \"10.3.1\"\n#define __ARM_ARCH 7\n#define NDEBUG\n";
        assert_eq!(
            parse_macro_dump(dump),
            [
                "__VERSION__=\"10.3.1\"",
                "__ARM_ARCH=7",
                "NDEBUG",
            ]
        );
    }

    #[test]
    fn function_macros_collapse_to_empty_value() {
        let dump = "#define __CONCAT(a,b) a ## b\n#define MAX(a, b) ((a) > (b) ? (a) : (b))\n";
        assert_eq!(parse_macro_dump(dump), ["__CONCAT(...)=", "MAX(...)="]);
    }

    #[test]
    fn junk_lines_are_skipped() {
        let dump = "warning: something\n#define \n  #define X 1\nplain text\n";
        assert_eq!(parse_macro_dump(dump), ["X=1"]);
    }

    #[test]
    fn missing_compiler_degrades_to_seeds() {
        std::env::set_var("FLINT_KEIL_C51_HOME", "/nonexistent/keil");
        let desc = ToolchainDescriptor::new(ToolchainId::Keil51);
        let result = run_probe(&desc);
        assert_eq!(result.macros, ["__C51__"]);
        assert!(result.include_dirs.is_empty());
        std::env::remove_var("FLINT_KEIL_C51_HOME");
    }
}
