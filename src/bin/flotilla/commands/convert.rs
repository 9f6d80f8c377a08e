//! `flotilla convert` command
//!
//! Runs the whole conversion pipeline over a module tree.

use anyhow::{bail, Result};

use flotilla::ops::{self, ConvertOptions};
use flotilla::util::diagnostic;
use flotilla::{GraphError, RewriteError, Workspace};

use crate::cli::ConvertArgs;

pub fn execute(args: ConvertArgs, color: bool) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let ws = Workspace::open(&root)?;

    let options = ConvertOptions {
        set_version: args.set_version,
        scope: args.scope,
        dry_run: args.dry_run,
    };

    let report = match ops::convert(&ws, &options) {
        Ok(report) => report,
        Err(err) => {
            if emit_diagnostic(&err, color) {
                bail!("conversion failed");
            }
            return Err(err);
        }
    };

    println!(
        "Converted {} packages at version {}",
        report.members.len(),
        report.version
    );
    println!("Workspace members in dependency order:");
    for name in &report.members {
        println!("  {}", name);
    }
    println!(
        "{} files rewritten, {} manifests written",
        report.files_rewritten, report.manifests_written
    );
    if report.dry_run {
        println!("Dry run: no files were written");
    }

    Ok(())
}

/// Print a structured diagnostic when the failure has one.
fn emit_diagnostic(err: &anyhow::Error, color: bool) -> bool {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<GraphError>() {
            diagnostic::emit(&e.to_diagnostic(), color);
            return true;
        }
        if let Some(e) = cause.downcast_ref::<RewriteError>() {
            diagnostic::emit(&e.to_diagnostic(), color);
            return true;
        }
    }
    false
}
