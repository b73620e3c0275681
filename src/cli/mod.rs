//! Command-line interface for ctxweave.
//!
//! This module handles argument parsing only; the pipeline logic lives in
//! the library modules.

use clap::Parser;

/// Ctxweave: context-propagation refactoring kernel for Go codebases.
#[derive(Parser, Debug)]
#[command(name = "ctxweave")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available ctxweave commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Thread a context parameter through a target and all of its callers.
    Propagate {
        /// Path to the Go file containing the target's declaration.
        #[arg(short, long)]
        file: std::path::PathBuf,

        /// Target identifier name.
        #[arg(short, long)]
        identifier: String,

        /// Identifier kind (function or interface method).
        #[arg(short, long)]
        kind: IdentifierKind,

        /// Accept every proposed edit without prompting.
        #[arg(long)]
        assume_yes: bool,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Insert trace-span boilerplate into HTTP handler declarations.
    Instrument {
        /// Glob pattern selecting the Go files to sweep.
        #[arg(short, long)]
        glob: String,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Identifier kind for the propagation target.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum IdentifierKind {
    /// A plain function declaration.
    Function,
    /// An interface method declaration.
    Interface,
}

impl IdentifierKind {
    /// Convert to the core target kind.
    pub fn to_target_kind(self) -> crate::locate::TargetKind {
        match self {
            IdentifierKind::Function => crate::locate::TargetKind::Function,
            IdentifierKind::Interface => crate::locate::TargetKind::Interface,
        }
    }
}

/// Parse command-line arguments.
///
/// This function is the entry point for CLI argument parsing.
/// It returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}
