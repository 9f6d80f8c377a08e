//! Export table synchronization for an already-converted workspace.
//!
//! Files come and go after conversion, and every added or removed public
//! module changes a package's export table. This op recomputes the table
//! for each package and folds it back into the package manifest, leaving
//! all other manifest fields alone. Drift detection and the conversion
//! itself share one table builder, so the two can never disagree about
//! what is exported.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::exports::build_export_table;
use crate::core::manifest::{updated_package_exports, ExportsField};
use crate::core::package::discover_package_dirs;
use crate::core::Workspace;
use crate::util::fs;

/// What an export sync found.
#[derive(Debug)]
pub struct SyncReport {
    /// Packages whose manifests were (or would be) rewritten
    pub updated: Vec<String>,

    /// Total packages examined
    pub checked: usize,
}

/// Recompute every package's exports and update manifests in place.
///
/// With `check` set, nothing is written and any drift is fatal, for use
/// as a CI gate.
pub fn sync_exports(ws: &Workspace, check: bool) -> Result<SyncReport> {
    let names = discover_package_dirs(ws.root())?;
    let manifest_name = ws.config().workspace.manifest.clone();

    let mut updated = Vec::new();
    for name in &names {
        let root = ws.root().join(name);
        let entries = build_export_table(&root, &manifest_name)
            .with_context(|| format!("failed to build export table for `{}`", name))?;
        let exports = ExportsField::from_entries(&entries);

        let manifest_path = root.join(&manifest_name);
        let text = fs::read_to_string(&manifest_path)
            .with_context(|| format!("`{}` has no manifest; convert the tree first", name))?;

        if !exports_drifted(&text, &exports)? {
            debug!("{}: exports up to date", name);
            continue;
        }

        if !check {
            let new_text = updated_package_exports(&text, &exports)?;
            fs::write_string(&manifest_path, &new_text)?;
            info!("updated exports for {}", name);
        }
        updated.push(name.clone());
    }

    if check && !updated.is_empty() {
        bail!("exports out of date for: {}", updated.join(", "));
    }

    Ok(SyncReport {
        updated,
        checked: names.len(),
    })
}

/// Compare by value, so formatting of the stored manifest does not count
/// as drift.
fn exports_drifted(manifest_text: &str, exports: &ExportsField) -> Result<bool> {
    let manifest: Value =
        serde_json::from_str(manifest_text).context("failed to parse package manifest")?;
    let new_value = serde_json::to_value(exports).context("failed to serialize exports")?;
    Ok(manifest.get("exports") != Some(&new_value))
}
