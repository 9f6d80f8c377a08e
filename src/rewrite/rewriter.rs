//! Import rewriting.
//!
//! Every scanned reference is resolved to a path in the tree and replaced
//! with its post-conversion spelling. Imports that stay inside their own
//! package become clean relative paths again; everything that crosses a
//! package boundary, including legacy URL imports, becomes a
//! package-qualified specifier under the workspace scope.
//!
//! Substitution is textual and keyed by the exact specifier string: each
//! distinct specifier in a file is replaced everywhere it occurs, longest
//! specifier first so no replacement corrupts a longer one it prefixes.
//! Qualified specifiers match neither scan pattern, so a second pass over
//! rewritten content changes nothing.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::exports::collapse_module_root;
use crate::core::package::{owner_of, Package};
use crate::rewrite::errors::RewriteError;
use crate::rewrite::scanner::{ImportKind, ImportReference, Scanner};
use crate::util::fs;

/// Rewrites import specifiers for one conversion run.
pub struct Rewriter<'a> {
    tree_root: &'a Path,
    scope: &'a str,
    packages: &'a [Package],
    scanner: Scanner,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        tree_root: &'a Path,
        scope: &'a str,
        packages: &'a [Package],
        legacy_prefix: &str,
    ) -> Result<Rewriter<'a>> {
        Ok(Rewriter {
            tree_root,
            scope,
            packages,
            scanner: Scanner::new(legacy_prefix)?,
        })
    }

    /// Rewrite all imports in one file's text.
    ///
    /// Returns the new text, or `None` when nothing needed to change.
    pub fn rewrite(&self, source: &str, file: &Path) -> Result<Option<String>, RewriteError> {
        let references = self.scanner.scan(source);
        if references.is_empty() {
            return Ok(None);
        }

        let from_pkg = owner_of(self.packages, file);
        let file_dir = file.parent().unwrap_or(self.tree_root);

        let mut seen: Vec<String> = Vec::new();
        let mut pairs: Vec<(String, String)> = Vec::new();
        for reference in references {
            if seen.contains(&reference.specifier) {
                continue;
            }
            seen.push(reference.specifier.clone());

            let target = self.resolve_target(&reference, file_dir);
            let to_pkg = target
                .starts_with(self.tree_root)
                .then(|| owner_of(self.packages, &target))
                .flatten()
                .ok_or_else(|| RewriteError::UnresolvedTarget {
                    file: file.to_path_buf(),
                    specifier: reference.specifier.clone(),
                })?;

            let new_specifier = match &reference.kind {
                ImportKind::Relative if from_pkg == Some(to_pkg) => {
                    relative_specifier(file_dir, &target)
                }
                _ => self.qualified_specifier(&target),
            };

            if new_specifier != reference.specifier {
                pairs.push((reference.specifier, new_specifier));
            }
        }

        if pairs.is_empty() {
            return Ok(None);
        }

        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let mut text = source.to_string();
        for (old, new) in &pairs {
            text = text.replace(old, new);
        }
        Ok(Some(text))
    }

    fn resolve_target(&self, reference: &ImportReference, file_dir: &Path) -> PathBuf {
        match &reference.kind {
            ImportKind::Relative => fs::normalize_lexical(&file_dir.join(&reference.specifier)),
            ImportKind::Legacy { path } => fs::normalize_lexical(&self.tree_root.join(path)),
        }
    }

    /// `@scope/pkg` for a module root, `@scope/pkg/key` for anything else.
    fn qualified_specifier(&self, target: &Path) -> String {
        let rel = fs::relative_path(self.tree_root, target);
        let collapsed = collapse_module_root(&fs::to_slash(&rel));
        format!("{}/{}", self.scope, collapsed)
    }
}

fn relative_specifier(file_dir: &Path, target: &Path) -> String {
    let rel = fs::to_slash(&fs::relative_path(file_dir, target));
    if rel.starts_with("../") {
        rel
    } else {
        format!("./{}", rel)
    }
}
