//! Export table discovery.
//!
//! Each package exposes an ordered table mapping public export keys to the
//! files behind them. The table is computed once per package by walking the
//! package root and applying the visibility rules; nothing mutates it
//! afterwards.

use std::path::Path;

use anyhow::{bail, Result};
use walkdir::WalkDir;

use crate::util::fs::to_slash;

/// The basename that collapses onto its parent directory's export key.
pub const MODULE_ROOT: &str = "mod";

/// A single public export: key as imported from outside the package, and
/// the `./`-prefixed path of the file behind it, relative to the package
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub key: String,
    pub path: String,
}

/// Strip the source extension from a slash-separated path and collapse a
/// trailing module-root segment onto its parent directory.
///
/// This is the one place the entry-file naming convention lives: export
/// keys, and the package-qualified specifiers the rewriter produces, both
/// go through here. Paths without a source extension (data files) come
/// back unchanged.
///
/// ```
/// use flotilla::core::exports::collapse_module_root;
///
/// assert_eq!(collapse_module_root("bytes/concat.ts"), "bytes/concat");
/// assert_eq!(collapse_module_root("path/mod.ts"), "path");
/// assert_eq!(collapse_module_root("mod.ts"), "");
/// assert_eq!(collapse_module_root("data.json"), "data.json");
/// ```
pub fn collapse_module_root(path: &str) -> String {
    let stripped = path
        .strip_suffix(".d.ts")
        .or_else(|| path.strip_suffix(".ts"));

    match stripped {
        None => path.to_string(),
        Some(s) if s == MODULE_ROOT => String::new(),
        Some(s) => match s.strip_suffix(&format!("/{}", MODULE_ROOT)) {
            Some(parent) => parent.to_string(),
            None => s.to_string(),
        },
    }
}

/// Derive the export key for a file path relative to its package root.
///
/// The package's own module root collapses to the identity key `"."`; every
/// other file keys under a `./`-prefixed fragment.
pub fn export_key(rel_path: &str) -> String {
    match collapse_module_root(rel_path) {
        s if s.is_empty() => ".".to_string(),
        s => format!("./{}", s),
    }
}

/// Walk a package root and build its ordered export table.
///
/// A file is public when it survives every exclusion rule: no hidden or
/// underscore-prefixed name anywhere in its path, not a test file, not
/// example or fixture data, not the package's manifest, and carrying a
/// recognized source extension (`.ts`, `.d.ts`) or being a `.json` data
/// file. Keys are sorted bytewise; a duplicate key is a defect in the tree
/// and aborts the run.
pub fn build_export_table(package_root: &Path, manifest_name: &str) -> Result<Vec<ExportEntry>> {
    let mut exports = Vec::new();

    for entry in WalkDir::new(package_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = to_slash(
            entry
                .path()
                .strip_prefix(package_root)
                .expect("walked file is under the package root"),
        );

        let stripped = rel
            .strip_suffix(".d.ts")
            .or_else(|| rel.strip_suffix(".ts"));
        if stripped.is_none() && !rel.ends_with(".json") {
            continue; // not a module source or data file
        }

        // Exclusion rules run against the extension-stripped name, with a
        // leading slash so top-level segments are checked like nested ones.
        let check = format!("/{}", stripped.unwrap_or(&rel));
        if check.contains("/.") || check.contains("/_") {
            continue; // hidden/internal files
        }
        if check.ends_with("_test") || check.ends_with("/test") {
            continue; // test files
        }
        if check.contains("/example/") || check.ends_with("_example") {
            continue; // example files
        }
        if check.contains("/testdata/") {
            continue; // fixture data
        }
        if check.ends_with(&format!("/{}", manifest_name)) {
            continue; // the package's own manifest
        }

        exports.push(ExportEntry {
            key: export_key(&rel),
            path: format!("./{}", rel),
        });
    }

    exports.sort_by(|a, b| a.key.cmp(&b.key));

    for pair in exports.windows(2) {
        if pair[0].key == pair[1].key {
            bail!(
                "duplicate export key `{}` in `{}`: `{}` and `{}` both collapse to it",
                pair[0].key,
                package_root.display(),
                pair[0].path,
                pair[1].path,
            );
        }
    }

    Ok(exports)
}
