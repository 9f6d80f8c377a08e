//! Workspace - the root of the module tree being converted.
//!
//! Opening a workspace pins down everything later stages depend on: the
//! canonical tree root, the configuration file next to it, and the root
//! manifest that will be rewritten at the end of a conversion.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use tracing::debug;

use crate::core::manifest::manifest_version;
use crate::util::config::{self, Config};
use crate::util::fs;

/// An opened workspace rooted at the module tree.
#[derive(Debug)]
pub struct Workspace {
    /// Canonical root of the module tree
    root: PathBuf,

    /// Configuration loaded from `flotilla.toml`, or defaults
    config: Config,
}

impl Workspace {
    /// Open the workspace at `root`.
    ///
    /// The root is canonicalized so that paths reported by the module
    /// analyzer compare equal to paths walked from the tree. The root
    /// manifest must already exist; conversion updates it rather than
    /// creating it.
    pub fn open(root: &Path) -> Result<Workspace> {
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve workspace root: {}", root.display()))?;

        let config_path = root.join(config::CONFIG_FILE_NAME);
        let config = Config::load_if_exists(&config_path)?;
        debug!("opened workspace at {}", root.display());

        let ws = Workspace { root, config };
        if !ws.manifest_path().is_file() {
            bail!(
                "no root manifest at {}; expected an existing `{}` to update",
                ws.manifest_path().display(),
                ws.config.workspace.manifest
            );
        }

        Ok(ws)
    }

    /// Canonical root of the module tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path to the root manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.workspace.manifest)
    }

    /// Read the root manifest text.
    pub fn manifest_text(&self) -> Result<String> {
        fs::read_to_string(&self.manifest_path())
    }

    /// Resolve the version stamped into every emitted manifest.
    ///
    /// Precedence is the explicit flag, then the configuration file, then
    /// the `version` field of the root manifest. No version anywhere is
    /// fatal; converting a tree without one would emit unpublishable
    /// manifests.
    pub fn resolve_version(&self, explicit: Option<&str>) -> Result<String> {
        let (version, source) = if let Some(v) = explicit {
            (v.to_string(), "--set-version")
        } else if let Some(v) = &self.config.workspace.version {
            (v.clone(), config::CONFIG_FILE_NAME)
        } else if let Some(v) = manifest_version(&self.manifest_text()?)? {
            (v, "root manifest")
        } else {
            bail!(
                "no package version found; pass --set-version, set `workspace.version` in {}, \
                 or add a `version` field to {}",
                config::CONFIG_FILE_NAME,
                self.manifest_path().display()
            );
        };

        Version::parse(&version)
            .with_context(|| format!("invalid semver version `{}` from {}", version, source))?;
        Ok(version)
    }
}
