//! Legacy string formats: macro lists, path lists, file-type codes.
//!
//! The legacy format flattens lists into single strings: include paths
//! join with `;`, macro definitions join with `, `. Macro values may be
//! quoted with single or double quotes; single-quote delimiters are
//! normalized to double quotes on the way in.

use flint_core::project::{source_kind, SourceKind};

/// Split a legacy macro-definition string on commas and whitespace,
/// respecting quoted values.
///
/// Quotes balance per token; an escaped quote (`\"`) is literal and does
/// not toggle the quoting state. Single-quote delimiters become double
/// quotes in the output.
pub fn split_macro_string(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('"') | Some('\'')) => {
                current.push('\\');
                // Escaped quote stays literal.
                if let Some(q) = chars.next() {
                    current.push(q);
                }
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push('"');
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push('"');
            }
            c if (c == ',' || c.is_whitespace()) && !in_single && !in_double => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Join macro definitions back into the legacy `, `-separated form.
pub fn join_macro_string(defines: &[String]) -> String {
    defines.join(", ")
}

/// Split a legacy `;`-separated path list, normalizing each entry.
pub fn split_path_list(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_path)
        .collect()
}

/// Join paths back into the legacy `;`-separated, backslash form.
pub fn join_path_list(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| to_keil_path(p))
        .collect::<Vec<_>>()
        .join(";")
}

/// Normalize a legacy path: backslashes become forward slashes and a
/// leading `./` is dropped.
pub fn normalize_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    forward
        .strip_prefix("./")
        .unwrap_or(&forward)
        .to_string()
}

/// Render a project-relative path the way the legacy IDE writes it.
pub fn to_keil_path(path: &str) -> String {
    let back = path.replace('/', "\\");
    if back.starts_with('\\') || back.chars().nth(1) == Some(':') {
        back
    } else {
        format!(".\\{back}")
    }
}

/// The legacy numeric file-type code for a path.
pub fn file_type_code(path: &str) -> u32 {
    match source_kind(path) {
        Some(SourceKind::C) => 1,
        Some(SourceKind::Asm) => 2,
        Some(SourceKind::Object) => 3,
        Some(SourceKind::Lib) => 4,
        Some(SourceKind::Cpp) => 8,
        None => 5,
    }
}
