//! Rewrite stage error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while rewriting import specifiers.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum RewriteError {
    /// An import resolved to a path no package owns. Guessing a specifier
    /// here would silently break the reference, so the run aborts.
    #[error("import `{specifier}` in {} resolves outside every package", file.display())]
    #[diagnostic(code(flotilla::rewrite::unresolved_target))]
    UnresolvedTarget { file: PathBuf, specifier: String },
}

impl RewriteError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RewriteError::UnresolvedTarget { file, specifier } => {
                Diagnostic::error(format!(
                    "import `{}` resolves outside every package",
                    specifier
                ))
                .with_location(file.clone())
                .with_suggestion(suggestions::STRAY_IMPORT)
            }
        }
    }
}
