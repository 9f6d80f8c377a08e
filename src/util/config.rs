//! Configuration file support for Flotilla.
//!
//! Conversion settings live in an optional `flotilla.toml` at the root of
//! the tree being converted. Every field has a default, so the file is only
//! needed when a tree deviates from the stock layout (different scope,
//! registry, analyzer, or legacy import scheme).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the configuration file, looked up at the tree root.
///
/// The file is tool-internal: it is never part of any package's export
/// table and never a rewrite target.
pub const CONFIG_FILE_NAME: &str = "flotilla.toml";

/// Flotilla configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace identity settings
    pub workspace: WorkspaceConfig,

    /// Legacy absolute-import scheme being migrated away from
    pub legacy: LegacyConfig,

    /// External module-graph analyzer invocation
    pub analyzer: AnalyzerConfig,

    /// Pre-conversion cleanup of the tree
    pub prepare: PrepareConfig,
}

/// Workspace identity: how packages are named and pinned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Scope prefix for package-qualified specifiers (e.g. `@std`)
    pub scope: String,

    /// Registry prefix for pinned dependency entries (e.g. `jsr`)
    pub registry: String,

    /// Shared workspace version. Falls back to the root manifest's
    /// `version` field when absent; `--set-version` overrides both.
    pub version: Option<String>,

    /// Manifest file name, per package and at the root
    pub manifest: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            scope: "@std".to_string(),
            registry: "jsr".to_string(),
            version: None,
            manifest: "deno.json".to_string(),
        }
    }
}

/// The versioned-URL import scheme the tree is migrating away from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// URL prefix, including the literal version placeholder token.
    /// Any occurrence of this prefix followed by a path is a rewrite
    /// target.
    pub prefix: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            prefix: "https://deno.land/std@$STD_VERSION/".to_string(),
        }
    }
}

/// How to invoke the external module-graph analyzer.
///
/// The analyzer receives a synthetic entry module importing every exported
/// file and must print a JSON module graph on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Program to run. Bare names are resolved through PATH.
    pub command: String,

    /// Leading arguments, before `--config <root manifest>` and the
    /// entry path.
    pub args: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            command: "deno".to_string(),
            args: vec!["info".to_string(), "--json".to_string()],
        }
    }
}

/// Tree cleanup applied before discovery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Root-relative files to delete (obsolete single-version artifacts)
    pub remove: Vec<String>,

    /// Literal text patches to apply
    pub patch: Vec<PatchEntry>,
}

/// A literal find/replace applied to one file during the prepare stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchEntry {
    /// Root-relative file to patch
    pub file: String,

    /// Exact text to find
    pub find: String,

    /// Replacement text
    pub replace: String,

    /// Replace every occurrence instead of only the first
    #[serde(default)]
    pub all: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, defaulting when the file does not exist.
    ///
    /// A file that exists but does not parse is an error: a half-read
    /// config would silently change rewrite semantics.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            Ok(Self::default())
        }
    }
}
