//! Pre-conversion tree cleanup.
//!
//! Single-version trees carry artifacts that make no sense in a workspace,
//! like a root version module or docs pinned to one release URL. The
//! prepare stage deletes and patches those before discovery runs, driven
//! entirely by the `[prepare]` section of the configuration.

use anyhow::{bail, Result};
use tracing::info;

use crate::core::Workspace;
use crate::util::diagnostic::{emit, Diagnostic};
use crate::util::fs;

/// Apply the configured removals and patches.
///
/// A removal target that is already gone is fatal, since it means the
/// configuration no longer describes this tree. A patch whose `find` text
/// is absent only warns; the text may simply have been rewritten by hand
/// already.
pub fn prepare_tree(ws: &Workspace, dry_run: bool) -> Result<()> {
    let prepare = &ws.config().prepare;

    for rel in &prepare.remove {
        let path = ws.root().join(rel);
        if !path.exists() {
            bail!("cannot remove `{}`: no such file in the tree", rel);
        }
        if dry_run {
            info!("would remove {}", rel);
            continue;
        }
        fs::remove_file(&path)?;
        info!("removed {}", rel);
    }

    for patch in &prepare.patch {
        let path = ws.root().join(&patch.file);
        let text = fs::read_to_string(&path)?;

        if !text.contains(&patch.find) {
            emit(
                &Diagnostic::warning(format!("patch text not found in {}", patch.file))
                    .with_context(format!("looking for `{}`", patch.find)),
                false,
            );
            continue;
        }

        let patched = if patch.all {
            text.replace(&patch.find, &patch.replace)
        } else {
            text.replacen(&patch.find, &patch.replace, 1)
        };

        if dry_run {
            info!("would patch {}", patch.file);
            continue;
        }
        fs::write_string(&path, &patched)?;
        info!("patched {}", patch.file);
    }

    Ok(())
}
