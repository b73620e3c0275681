//! Trace-span instrumentation for HTTP handlers.
//!
//! Sweeps Go files matched by a glob pattern and inserts the span
//! boilerplate after every function declaration that receives a
//! `*http.Request`, deriving the span's context from the request itself.
//! Unlike the propagation pipeline there is no per-edit confirmation; the
//! sweep is meant for bulk instrumentation of handler packages.

use crate::apply::{write_atomic, SourceLines};
use crate::error::{Result, WeaveError};
use crate::rewrite::span_boilerplate;
use crate::tools::Formatter;
use glob::glob;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Captures the function name and the request parameter name from a
/// handler declaration line.
static HTTP_HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"func (\w*).* (\w*) \*http\.Request")
        .expect("HTTP_HANDLER_RE regex should compile")
});

/// Inputs for one instrumentation sweep.
#[derive(Debug, Clone)]
pub struct InstrumentConfig {
    /// Glob pattern selecting the files to sweep (e.g. `handlers/*.go`).
    pub pattern: String,
}

/// Summary of a completed instrumentation sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstrumentReport {
    /// Files the sweep visited.
    pub files_scanned: usize,
    /// Handler declarations that received span boilerplate.
    pub handlers_instrumented: usize,
    /// De-duplicated files that were modified.
    pub impacted_files: Vec<String>,
}

/// Sweep all files matching the configured glob pattern.
///
/// Modified files are rewritten atomically and then handed to the
/// formatter, in path order.
pub fn run_instrument(
    config: &InstrumentConfig,
    formatter: &dyn Formatter,
) -> Result<InstrumentReport> {
    let paths = glob(&config.pattern)
        .map_err(|e| WeaveError::Other(format!("Invalid glob pattern: {}", e)))?;

    let mut report = InstrumentReport::default();
    let mut impacted: BTreeSet<PathBuf> = BTreeSet::new();

    for entry in paths {
        let path =
            entry.map_err(|e| WeaveError::Other(format!("Glob iteration error: {}", e)))?;

        if path.is_dir() {
            continue;
        }
        report.files_scanned += 1;

        let instrumented = instrument_file(&path)?;
        if instrumented > 0 {
            log::info!(
                "Instrumented {} handler(s) in {}",
                instrumented,
                path.display()
            );
            report.handlers_instrumented += instrumented;
            impacted.insert(path);
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

/// Insert span boilerplate after each handler declaration in one file.
///
/// Returns the number of handlers instrumented; the file is only rewritten
/// when at least one declaration matched.
fn instrument_file(path: &Path) -> Result<usize> {
    let source = SourceLines::read(path)?;

    let mut rewritten: Vec<String> = Vec::with_capacity(source.len());
    let mut instrumented = 0;

    for line in source.borrowed() {
        rewritten.push(line.to_string());

        if !line.contains("func ") {
            continue;
        }

        if let Some(captures) = HTTP_HANDLER_RE.captures(line) {
            let name = captures.get(1).map_or("", |m| m.as_str());
            let request = captures.get(2).map_or("", |m| m.as_str());

            let [start, finish] = span_boilerplate(&format!("{}.Context()", request), name);
            rewritten.push(start);
            rewritten.push(finish);
            instrumented += 1;
        }
    }

    if instrumented > 0 {
        let mut content = rewritten.join("\n");
        if source.to_content().ends_with('\n') {
            content.push('\n');
        }
        write_atomic(path, content.as_bytes())?;
    }

    Ok(instrumented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_handler_gains_span_boilerplate() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("login.go");
        fs::write(
            &file,
            "package handlers\n\nfunc Login(w http.ResponseWriter, req *http.Request) {\n\trender(w)\n}\n",
        )
        .expect("Failed to write file");

        let instrumented = instrument_file(&file).expect("instrument should succeed");

        assert_eq!(instrumented, 1);
        let content = fs::read_to_string(&file).expect("Failed to read file");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[3],
            "\tspan, _ := tracer.CreateSpanFromContext(req.Context(), logTag+\".Login\")"
        );
        assert_eq!(lines[4], "\tdefer span.Finish()");
    }

    #[test]
    fn test_file_without_handlers_is_untouched() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("util.go");
        let original = "package handlers\n\nfunc helper(n int) int {\n\treturn n + 1\n}\n";
        fs::write(&file, original).expect("Failed to write file");

        let instrumented = instrument_file(&file).expect("instrument should succeed");

        assert_eq!(instrumented, 0);
        assert_eq!(
            fs::read_to_string(&file).expect("Failed to read file"),
            original
        );
    }
}
