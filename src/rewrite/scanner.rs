//! Import specifier scanning.
//!
//! One pass over a file's text finds every rewrite candidate: relative
//! `from` imports and absolute URLs under the legacy distribution prefix.
//! Both pattern hits come back in a single kind-tagged stream so the
//! rewriter applies one uniform substitution step, with no chance of one
//! pattern rewriting the output of the other.

use anyhow::{Context, Result};
use regex::Regex;

/// How an import specifier was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `./` or `../` specifier, resolved against the importing file
    Relative,
    /// Versioned URL under the legacy prefix; carries the tree-relative
    /// path that followed the prefix
    Legacy { path: String },
}

/// One import found in a file, specifier exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub specifier: String,
    pub kind: ImportKind,
}

/// Matches `from "./x"` and `from '../x'` in imports and re-exports.
/// Side-effect imports carry no `from` and stay untouched.
const RELATIVE_IMPORT: &str = r#"from\s+["'](\.\.?/[^"']+)["']"#;

/// Compiled patterns for one conversion run.
pub struct Scanner {
    relative: Regex,
    legacy: Regex,
}

impl Scanner {
    /// Compile both patterns. The legacy prefix is matched literally, so
    /// version placeholder tokens like `$STD_VERSION` survive escaping.
    pub fn new(legacy_prefix: &str) -> Result<Scanner> {
        let relative =
            Regex::new(RELATIVE_IMPORT).context("failed to compile relative import pattern")?;
        let legacy = Regex::new(&format!(r#"{}([^"'\s]+)"#, regex::escape(legacy_prefix)))
            .context("failed to compile legacy import pattern")?;
        Ok(Scanner { relative, legacy })
    }

    /// Find every import reference in `source`.
    pub fn scan(&self, source: &str) -> Vec<ImportReference> {
        let mut refs = Vec::new();

        for cap in self.relative.captures_iter(source) {
            refs.push(ImportReference {
                specifier: cap[1].to_string(),
                kind: ImportKind::Relative,
            });
        }

        for cap in self.legacy.captures_iter(source) {
            refs.push(ImportReference {
                specifier: cap[0].to_string(),
                kind: ImportKind::Legacy {
                    path: cap[1].to_string(),
                },
            });
        }

        refs
    }
}
