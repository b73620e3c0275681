//! External collaborator tools.
//!
//! The byte-offset locator (`grep`), the cross-file reference finder
//! (`guru`), and the formatter/import-fixer pair (`gofmt`/`goimports`) are
//! external binaries. The traits here keep the engine independent of them:
//! the driver consumes raw tool output through [`ReferenceSource`] and hands
//! impacted files to a [`Formatter`], so tests can substitute canned output
//! for the real processes.

use crate::apply::{write_atomic, SourceLines};
use crate::error::{Result, WeaveError};
use crate::locate::TargetKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

/// The vendored context import path expected by the target codebases.
const NET_CONTEXT_IMPORT: &str = "\"golang.org/x/net/context\"";

/// Query describing the declaration search for one target identifier.
#[derive(Debug, Clone)]
pub struct LocatorQuery {
    /// File expected to contain the declaration.
    pub file: PathBuf,
    /// Target identifier name.
    pub identifier: String,
    /// Whether the target is a function or an interface method.
    pub kind: TargetKind,
}

/// Source of declaration matches and cross-file references.
///
/// Implementations return the collaborating tool's raw line-oriented
/// output; parsing stays in [`crate::locate`].
pub trait ReferenceSource {
    /// Locate candidate declaration lines for the query, as
    /// `<lineNumber>:<byteOffset>:<lineText>` output.
    fn locate_declarations(&self, query: &LocatorQuery) -> Result<String>;

    /// List every reference to the identifier at the given absolute byte
    /// span, as `<path>:<startLine>.<startCol>-<endLine>.<endCol>:<message>`
    /// output whose first line is the declaration itself.
    fn find_referrers(&self, file: &Path, start: usize, end: usize) -> Result<String>;
}

/// Post-edit formatter and import fixer.
pub trait Formatter {
    /// Reformat a file and normalize its import declarations.
    fn format_file(&self, path: &Path) -> Result<()>;
}

/// Build the locator patterns for an identifier kind.
///
/// Function targets match both plain declarations and function-value
/// assignments; interface targets match method declarations anchored at the
/// start of the line.
pub fn locator_patterns(kind: TargetKind, identifier: &str) -> Vec<String> {
    match kind {
        TargetKind::Function => vec![
            format!("func .*{}(", identifier),
            format!("var {} = func(", identifier),
        ],
        TargetKind::Interface => vec![format!("^\\s{}(", identifier)],
    }
}

/// Real tool bindings resolved from `PATH`.
#[derive(Debug, Clone)]
pub struct GoTools {
    grep: PathBuf,
    guru: PathBuf,
    gofmt: PathBuf,
    goimports: PathBuf,
}

impl GoTools {
    /// Resolve all collaborating binaries up front.
    ///
    /// # Errors
    /// Returns [`WeaveError::ToolNotFound`] naming the first missing binary,
    /// before any file I/O happens.
    pub fn new() -> Result<Self> {
        Ok(GoTools {
            grep: resolve_tool("grep")?,
            guru: resolve_tool("guru")?,
            gofmt: resolve_tool("gofmt")?,
            goimports: resolve_tool("goimports")?,
        })
    }

    fn run(&self, binary: &Path, name: &str, args: &[String]) -> Result<std::process::Output> {
        log::debug!("running {} {:?}", name, args);
        Command::new(binary)
            .args(args)
            .output()
            .map_err(|e| WeaveError::ToolFailed {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }
}

impl ReferenceSource for GoTools {
    fn locate_declarations(&self, query: &LocatorQuery) -> Result<String> {
        let mut args = vec!["-ban".to_string()];
        for pattern in locator_patterns(query.kind, &query.identifier) {
            args.push("-e".to_string());
            args.push(pattern);
        }
        args.push(query.file.display().to_string());

        let output = self.run(&self.grep, "grep", &args)?;

        // Exit status 1 means no matches, which is an empty result rather
        // than a failure.
        if output.status.code() == Some(1) {
            return Ok(String::new());
        }
        if !output.status.success() {
            return Err(WeaveError::ToolFailed {
                tool: "grep".to_string(),
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn find_referrers(&self, file: &Path, start: usize, end: usize) -> Result<String> {
        let target = format!("{}:#{},#{}", file.display(), start, end);
        let args = vec!["referrers".to_string(), target];

        let output = self.run(&self.guru, "guru", &args)?;

        if !output.status.success() {
            return Err(WeaveError::ToolFailed {
                tool: "guru".to_string(),
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Formatter for GoTools {
    fn format_file(&self, path: &Path) -> Result<()> {
        let file = path.display().to_string();

        run_formatter(self, &self.gofmt, "gofmt", &["-s", "-w", &file])?;
        run_formatter(self, &self.goimports, "goimports", &["-w", &file])?;

        // The target codebases vendor golang.org/x/net/context; a bare
        // "context" import introduced by goimports has to be rewritten, and
        // goimports runs once more to re-sort the import block.
        if normalize_context_import(path)? {
            run_formatter(self, &self.goimports, "goimports", &["-w", &file])?;
        }

        Ok(())
    }
}

fn run_formatter(tools: &GoTools, binary: &Path, name: &str, args: &[&str]) -> Result<()> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let output = tools.run(binary, name, &args)?;

    if !output.status.success() {
        return Err(WeaveError::ToolFailed {
            tool: name.to_string(),
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(())
}

/// Rewrite a bare `"context"` import to the vendored
/// `"golang.org/x/net/context"` path.
///
/// Returns whether the file changed. Only import lines are touched; string
/// literals elsewhere in the file are left alone.
pub fn normalize_context_import(path: &Path) -> Result<bool> {
    let mut source = SourceLines::read(path)?;
    let mut changed = false;

    for index in 0..source.len() {
        let Some(line) = source.line(index) else {
            continue;
        };
        let trimmed = line.trim();
        if trimmed == "\"context\"" || trimmed == "import \"context\"" {
            let replaced = line.replace("\"context\"", NET_CONTEXT_IMPORT);
            source.set_line(index, replaced);
            changed = true;
        }
    }

    if changed {
        write_atomic(path, source.to_content().as_bytes())?;
    }

    Ok(changed)
}

fn resolve_tool(name: &str) -> Result<PathBuf> {
    which(name).map_err(|_| WeaveError::ToolNotFound {
        tool: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_function_patterns_cover_both_declaration_forms() {
        let patterns = locator_patterns(TargetKind::Function, "Update");

        assert_eq!(patterns, vec!["func .*Update(", "var Update = func("]);
    }

    #[test]
    fn test_interface_pattern_is_line_anchored() {
        let patterns = locator_patterns(TargetKind::Interface, "Update");

        assert_eq!(patterns, vec!["^\\sUpdate("]);
    }

    #[test]
    fn test_context_import_is_rewritten() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("user.go");
        fs::write(
            &file,
            "package user\n\nimport (\n\t\"context\"\n\t\"fmt\"\n)\n",
        )
        .expect("Failed to write file");

        let changed = normalize_context_import(&file).expect("rewrite should succeed");

        assert!(changed);
        let content = fs::read_to_string(&file).expect("Failed to read file");
        assert!(content.contains("\t\"golang.org/x/net/context\""));
        assert!(!content.contains("\t\"context\""));
    }

    #[test]
    fn test_context_string_literals_are_left_alone() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("user.go");
        let original = "package user\n\nvar kind = \"context\" + suffix\n";
        fs::write(&file, original).expect("Failed to write file");

        let changed = normalize_context_import(&file).expect("rewrite should succeed");

        assert!(!changed);
        assert_eq!(
            fs::read_to_string(&file).expect("Failed to read file"),
            original
        );
    }
}
