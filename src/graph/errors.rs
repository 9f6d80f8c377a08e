//! Graph stage error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while loading the module graph or ordering packages.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("module analyzer `{command}` failed")]
    #[diagnostic(code(flotilla::graph::analyzer_failed))]
    AnalyzerFailed { command: String, detail: String },

    #[error("malformed module graph output: {reason}")]
    #[diagnostic(code(flotilla::graph::malformed_output))]
    MalformedOutput { reason: String },

    #[error("circular dependency between packages")]
    #[diagnostic(
        code(flotilla::graph::package_cycle),
        help("Move the shared modules into a package both sides can depend on")
    )]
    CycleDetected { packages: Vec<String> },
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::AnalyzerFailed { command, detail } => {
                Diagnostic::error(format!("module analyzer `{}` failed", command))
                    .with_context(detail.clone())
                    .with_suggestion(suggestions::ANALYZER_NOT_FOUND)
            }

            GraphError::MalformedOutput { reason } => {
                Diagnostic::error(format!("malformed module graph output: {}", reason))
                    .with_suggestion(suggestions::ANALYZER_OUTPUT)
            }

            GraphError::CycleDetected { packages } => {
                Diagnostic::error("circular dependency between packages")
                    .with_context(format!("cycle: {}", packages.join(" -> ")))
                    .with_suggestion(suggestions::BREAK_CYCLE)
            }
        }
    }
}
