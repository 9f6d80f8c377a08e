//! `flotilla exports` command
//!
//! Recomputes export tables for every package and updates manifests, or
//! verifies them with `--check`.

use anyhow::Result;

use flotilla::ops;
use flotilla::Workspace;

use crate::cli::ExportsArgs;

pub fn execute(args: ExportsArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let ws = Workspace::open(&root)?;

    let report = ops::sync_exports(&ws, args.check)?;

    if report.updated.is_empty() {
        println!("Exports up to date across {} packages", report.checked);
    } else {
        println!(
            "Updated exports for {} of {} packages:",
            report.updated.len(),
            report.checked
        );
        for name in &report.updated {
            println!("  {}", name);
        }
    }

    Ok(())
}
