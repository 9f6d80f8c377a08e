//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Flotilla - converts a flat module tree into a multi-package workspace
#[derive(Parser)]
#[command(name = "flotilla")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert the module tree into a multi-package workspace
    Convert(ConvertArgs),

    /// Recompute package export tables and update manifests
    Exports(ExportsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Root of the module tree (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Version stamped into every package manifest
    #[arg(long, value_name = "VERSION")]
    pub set_version: Option<String>,

    /// Scope for package-qualified specifiers (e.g. @std)
    #[arg(long)]
    pub scope: Option<String>,

    /// Plan the conversion without writing any files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ExportsArgs {
    /// Root of the workspace (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Fail instead of writing when exports are out of date
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
