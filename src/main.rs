//! Ctxweave CLI binary
//!
//! This is the main entry point for the ctxweave command-line interface.
//! The CLI is a thin adapter over existing APIs - NO logic is implemented here.

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = ctxweave::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::init();
    }

    // Execute command
    let result = match cli.command {
        ctxweave::cli::Commands::Propagate {
            file,
            identifier,
            kind,
            assume_yes,
            json,
        } => execute_propagate(file, identifier, kind, assume_yes, json),

        ctxweave::cli::Commands::Instrument { glob, json } => execute_instrument(glob, json),
    };

    // Handle result
    match result {
        Ok(msg) => {
            println!("{}", msg);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Execute the propagate command.
///
/// This function is a thin adapter that:
/// 1. Resolves the external collaborator binaries
/// 2. Picks the confirmation policy
/// 3. Runs the propagation pipeline
/// 4. Renders the run summary
fn execute_propagate(
    file: PathBuf,
    identifier: String,
    kind: ctxweave::cli::IdentifierKind,
    assume_yes: bool,
    json: bool,
) -> Result<String, ctxweave::WeaveError> {
    use ctxweave::confirm::{AcceptAll, Confirmer, StdinConfirmer};
    use ctxweave::propagate::{run_propagation, PropagateConfig};
    use ctxweave::tools::GoTools;

    let tools = GoTools::new()?;

    let config = PropagateConfig {
        file,
        identifier,
        kind: kind.to_target_kind(),
    };

    let mut confirmer: Box<dyn Confirmer> = if assume_yes {
        Box::new(AcceptAll)
    } else {
        Box::new(StdinConfirmer::new())
    };

    let report = run_propagation(&config, &tools, &tools, confirmer.as_mut())?;

    if json {
        return serde_json::to_string_pretty(&report)
            .map_err(|e| ctxweave::WeaveError::Other(format!("Failed to render summary: {}", e)));
    }

    Ok(format!(
        "Rewrote {} of {} call sites and {} declaration(s) for '{}'; {} file(s) formatted. We are done!",
        report.call_sites_rewritten,
        report.call_sites,
        report.declarations_rewritten,
        report.identifier,
        report.impacted_files.len()
    ))
}

/// Execute the instrument command.
///
/// This function is a thin adapter that runs the handler sweep and renders
/// the run summary.
fn execute_instrument(glob: String, json: bool) -> Result<String, ctxweave::WeaveError> {
    use ctxweave::instrument::{run_instrument, InstrumentConfig};
    use ctxweave::tools::GoTools;

    let tools = GoTools::new()?;

    let config = InstrumentConfig { pattern: glob };
    let report = run_instrument(&config, &tools)?;

    if json {
        return serde_json::to_string_pretty(&report)
            .map_err(|e| ctxweave::WeaveError::Other(format!("Failed to render summary: {}", e)));
    }

    Ok(format!(
        "Instrumented {} handler(s) across {} file(s). We are done!",
        report.handlers_instrumented,
        report.impacted_files.len()
    ))
}
