//! The context-propagation pipeline.
//!
//! Orchestrates one full run: locate candidate declarations, confirm the
//! right one with the operator, resolve its absolute byte span, list every
//! reference through the external finder, rewrite each call site in the
//! order reported, rewrite the declaration itself last, and hand the set of
//! impacted files to the formatter. Files are processed strictly
//! sequentially; the only blocking is on operator input between edits.

use crate::apply::{self, EditOutcome};
use crate::confirm::Confirmer;
use crate::error::Result;
use crate::locate::offset::{calculate_function_offset, calculate_interface_offset};
use crate::locate::{parse_locator_output, parse_referrer_output, TargetKind};
use crate::tools::{Formatter, LocatorQuery, ReferenceSource};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Inputs for one propagation run.
#[derive(Debug, Clone)]
pub struct PropagateConfig {
    /// File expected to contain the target's declaration.
    pub file: PathBuf,
    /// Target identifier name.
    pub identifier: String,
    /// Whether the target is a function or an interface method.
    pub kind: TargetKind,
}

/// Summary of a completed propagation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PropagationReport {
    /// Target identifier name.
    pub identifier: String,
    /// Target identifier kind.
    pub kind: String,
    /// Declaration candidates reported by the locator.
    pub candidates: usize,
    /// Candidates the operator confirmed.
    pub candidates_confirmed: usize,
    /// Call sites reported by the reference finder.
    pub call_sites: usize,
    /// Call sites rewritten.
    pub call_sites_rewritten: usize,
    /// Call sites the operator declined.
    pub call_sites_declined: usize,
    /// Declaration lines rewritten.
    pub declarations_rewritten: usize,
    /// De-duplicated files that received at least one applied edit.
    pub impacted_files: Vec<String>,
}

/// Run the full propagation pipeline for one target identifier.
///
/// Per-candidate failures (an identifier that cannot be located on its
/// reported line, malformed reference-finder output) abort that candidate
/// only and the run proceeds to the next; no edit is ever applied from
/// partial data. Impacted files are formatted once each, in path order.
pub fn run_propagation(
    config: &PropagateConfig,
    source: &dyn ReferenceSource,
    formatter: &dyn Formatter,
    confirmer: &mut dyn Confirmer,
) -> Result<PropagationReport> {
    let mut report = PropagationReport {
        identifier: config.identifier.clone(),
        kind: config.kind.as_str().to_string(),
        ..PropagationReport::default()
    };

    let query = LocatorQuery {
        file: config.file.clone(),
        identifier: config.identifier.clone(),
        kind: config.kind,
    };

    let raw = source.locate_declarations(&query)?;
    let candidates = parse_locator_output(&raw, &config.file)?;
    report.candidates = candidates.len();

    if candidates.is_empty() {
        log::warn!(
            "No declaration candidates for '{}' in {}",
            config.identifier,
            config.file.display()
        );
        return Ok(report);
    }

    let mut impacted: BTreeSet<PathBuf> = BTreeSet::new();

    for candidate in &candidates {
        let prompt = format!(
            "Is this the correct {}?\n  {} => {}",
            config.kind.as_str(),
            candidate.start_line,
            candidate.text
        );
        if !confirmer.confirm(&prompt)? {
            log::info!("skipping to the next {}", config.kind.as_str());
            continue;
        }
        report.candidates_confirmed += 1;

        let span = match config.kind {
            TargetKind::Function => {
                calculate_function_offset(&candidate.text, &config.identifier, candidate.start_offset)
            }
            TargetKind::Interface => {
                calculate_interface_offset(&candidate.text, &config.identifier, candidate.start_offset)
            }
        };
        let (start, end) = match span {
            Ok(span) => span,
            Err(e) => {
                log::error!("Skipping candidate at line {}: {}", candidate.start_line, e);
                continue;
            }
        };

        let raw_references = source.find_referrers(&config.file, start, end)?;
        let references = match parse_referrer_output(&raw_references) {
            Ok(references) => references,
            Err(e) => {
                log::error!("Skipping candidate at line {}: {}", candidate.start_line, e);
                continue;
            }
        };

        if references.is_empty() {
            log::warn!(
                "Reference finder returned nothing for '{}'",
                config.identifier
            );
            continue;
        }

        // The first reference is always the declaration itself; it is
        // rewritten last so call-site line numbers stay valid.
        let declaration = &references[0];
        let call_sites = &references[1..];
        report.call_sites += call_sites.len();

        for site in call_sites {
            match apply::rewrite_call_site(
                &site.path,
                &config.identifier,
                site.start_line - 1,
                confirmer,
            ) {
                Ok(result) => match result.outcome {
                    EditOutcome::Applied => {
                        report.call_sites_rewritten += 1;
                        impacted.insert(result.path);
                    }
                    EditOutcome::Declined => report.call_sites_declined += 1,
                    EditOutcome::Unchanged => {}
                },
                Err(e) => log::error!(
                    "Skipping call site {}:{}: {}",
                    site.path.display(),
                    site.start_line,
                    e
                ),
            }
        }

        match apply::rewrite_declaration(
            &declaration.path,
            &config.identifier,
            declaration.start_line - 1,
            config.kind,
            confirmer,
        ) {
            Ok(result) => {
                if result.outcome == EditOutcome::Applied {
                    report.declarations_rewritten += 1;
                    impacted.insert(result.path);
                }
            }
            Err(e) => log::error!(
                "Skipping declaration {}:{}: {}",
                declaration.path.display(),
                declaration.start_line,
                e
            ),
        }
    }

    for path in &impacted {
        if let Err(e) = formatter.format_file(path) {
            log::error!("Formatter failed for {}: {}", path.display(), e);
        }
    }

    report.impacted_files = impacted
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    Ok(report)
}
