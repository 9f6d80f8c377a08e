//! Package - a top-level directory becoming an independently importable unit.
//!
//! A Package combines its directory identity with the export table computed
//! for it. Identity and exports are fixed at construction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::exports::ExportEntry;

/// A discovered package: directory name, root path, and export table.
#[derive(Debug, Clone)]
pub struct Package {
    /// Directory name, which is also the unscoped package name
    name: String,

    /// Root directory of the package
    root: PathBuf,

    /// Ordered export table, fixed after construction
    exports: Vec<ExportEntry>,
}

impl Package {
    /// Create a package from its discovered identity and export table.
    pub fn new(name: impl Into<String>, root: PathBuf, exports: Vec<ExportEntry>) -> Self {
        Package {
            name: name.into(),
            root,
            exports,
        }
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the package root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the export table.
    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    /// Absolute paths of every exported file.
    pub fn export_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.exports.iter().map(|e| {
            // Export paths are `./`-prefixed relative fragments.
            self.root.join(e.path.trim_start_matches("./"))
        })
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Package {}

/// List the top-level directories that qualify as packages, in
/// lexicographic order.
///
/// Hidden and underscore-prefixed directories are not packages; neither is
/// anything that is not a directory. The sorted order seeds every
/// downstream traversal, so a run is deterministic regardless of
/// directory-listing order.
pub fn discover_package_dirs(tree_root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    let entries = std::fs::read_dir(tree_root)
        .with_context(|| format!("failed to read tree root: {}", tree_root.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry under: {}", tree_root.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat: {}", entry.path().display()))?;
        if !file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }

        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Find the package owning a path, by longest-prefix match against the
/// known package roots.
///
/// Files at the tree root, the synthetic entry module, and anything else
/// outside every package come back as `None`.
pub fn owner_of<'a>(packages: &'a [Package], path: &Path) -> Option<&'a Package> {
    packages
        .iter()
        .filter(|pkg| path.starts_with(pkg.root()))
        .max_by_key(|pkg| pkg.root().as_os_str().len())
}
