//! Edit application with per-edit confirmation and atomic replacement.
//!
//! Files are rewritten whole, line by line: unaffected lines are copied
//! verbatim, the affected line is replaced, and the original file is only
//! swapped out after the complete rewrite has been written and synced to a
//! temporary file in the same directory. A crash mid-rewrite never leaves a
//! partially-written file in place. Every proposed mutation passes the
//! operator's confirmation gate first; declining keeps the original bytes.

use crate::confirm::Confirmer;
use crate::error::{Result, WeaveError};
use crate::locate::TargetKind;
use crate::rewrite;
use crate::scope::select::select_context;
use crate::scope::{self, ScopeFrame};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A proposed one-line mutation awaiting operator confirmation.
///
/// Never persisted; either applied (line replaced) or discarded (original
/// line kept) before the file is rewritten.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    /// Line index being mutated (0-based).
    pub line_number: usize,
    /// The line as it currently reads.
    pub original: String,
    /// The line as it would read after the edit.
    pub proposed: String,
    /// Enclosing declaration, for display context.
    pub frame: Option<ScopeFrame>,
}

impl PendingEdit {
    /// Render the confirmation prompt shown to the operator.
    pub fn render_prompt(&self, path: &Path) -> String {
        let mut prompt = String::from("Do you want to make the following changes inside\n");

        match &self.frame {
            Some(frame) => prompt.push_str(&format!(
                "{}: {}: {}?\n",
                path.display(),
                frame.header_line_number + 1,
                frame.header_line.trim_end()
            )),
            None => prompt.push_str(&format!("{}?\n", path.display())),
        }

        prompt.push_str(&format!(
            "{}: {}\n  to\n{}: {}",
            self.line_number + 1,
            self.original,
            self.line_number + 1,
            self.proposed
        ));

        prompt
    }
}

/// Terminal state of one proposed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was confirmed and the file rewritten.
    Applied,
    /// The operator declined; the file is untouched.
    Declined,
    /// The line did not contain anything to rewrite; the file is untouched.
    Unchanged,
}

/// Summary of one edit attempt against a file.
#[derive(Debug, Clone)]
pub struct FileRewrite {
    /// The file the edit targeted.
    pub path: PathBuf,
    /// What happened to the edit.
    pub outcome: EditOutcome,
    /// SHA-256 of the file content before the attempt.
    pub before_hash: String,
    /// SHA-256 of the file content after the attempt (equals `before_hash`
    /// unless the edit was applied).
    pub after_hash: String,
}

/// A file's content held as individually addressable lines.
///
/// Joining the lines back together reproduces the original bytes exactly,
/// including the presence or absence of a trailing newline.
#[derive(Debug, Clone)]
pub struct SourceLines {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl SourceLines {
    /// Read a file into lines.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WeaveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_content(&content))
    }

    /// Split content into lines, remembering the trailing-newline state.
    pub fn from_content(content: &str) -> Self {
        let trailing_newline = content.ends_with('\n');
        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        if trailing_newline {
            lines.pop();
        }
        SourceLines {
            lines,
            trailing_newline,
        }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true when the file has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Borrow a line by 0-based index.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Replace a line by 0-based index. Out-of-range indices are ignored.
    pub fn set_line(&mut self, index: usize, text: String) {
        if let Some(slot) = self.lines.get_mut(index) {
            *slot = text;
        }
    }

    /// Insert lines immediately after the given 0-based index.
    pub fn insert_after(&mut self, index: usize, inserted: &[String]) {
        for (count, line) in inserted.iter().enumerate() {
            self.lines.insert(index + 1 + count, line.clone());
        }
    }

    /// Borrow all lines as string slices for scanning.
    pub fn borrowed(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// Reassemble the file content.
    pub fn to_content(&self) -> String {
        let mut content = self.lines.join("\n");
        if self.trailing_newline {
            content.push('\n');
        }
        content
    }
}

/// Compute the lowercase hex SHA-256 digest of content.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Write content to a temporary file in the target's directory, sync it,
/// and atomically rename it over the target.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| WeaveError::Other(format!("{} has no parent directory", path.display())))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    temp.write_all(content).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    temp.as_file().sync_all().map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    temp.persist(path).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Rewrite one call site to thread a context expression through it.
///
/// Scans the file up to the target line to determine the enclosing scope
/// and the context expression to propagate, proposes the rewritten line,
/// and applies it only after operator confirmation.
///
/// # Errors
/// Returns [`WeaveError::LineOutOfRange`] when the reference points past the
/// end of the file.
pub fn rewrite_call_site(
    path: &Path,
    identifier: &str,
    target_line: usize,
    confirmer: &mut dyn Confirmer,
) -> Result<FileRewrite> {
    let mut source = SourceLines::read(path)?;
    let before_content = source.to_content();
    let before_hash = compute_hash(before_content.as_bytes());

    let original = source
        .line(target_line)
        .ok_or_else(|| WeaveError::LineOutOfRange {
            path: path.to_path_buf(),
            line: target_line,
        })?
        .to_string();

    let borrowed = source.borrowed();
    let scan = scope::scan_to_line(&borrowed, target_line);
    let context = select_context(scan.child_context.as_deref(), scan.incoming_context());
    let proposed = rewrite::insert_call_context(&original, identifier, &context);

    if proposed == original {
        log::warn!(
            "No call to '{}' found on {}:{}",
            identifier,
            path.display(),
            target_line + 1
        );
        return Ok(FileRewrite {
            path: path.to_path_buf(),
            outcome: EditOutcome::Unchanged,
            after_hash: before_hash.clone(),
            before_hash,
        });
    }

    let edit = PendingEdit {
        line_number: target_line,
        original,
        proposed,
        frame: scan.frame,
    };

    if !confirmer.confirm(&edit.render_prompt(path))? {
        log::info!("skipping to the next result");
        return Ok(FileRewrite {
            path: path.to_path_buf(),
            outcome: EditOutcome::Declined,
            after_hash: before_hash.clone(),
            before_hash,
        });
    }

    source.set_line(target_line, edit.proposed);
    let content = source.to_content();
    write_atomic(path, content.as_bytes())?;

    Ok(FileRewrite {
        path: path.to_path_buf(),
        outcome: EditOutcome::Applied,
        before_hash,
        after_hash: compute_hash(content.as_bytes()),
    })
}

/// Rewrite the target's own declaration line.
///
/// The declaration gains `ctx context.Context` as its first parameter. For
/// plain function declarations the operator is additionally offered the
/// trace-span boilerplate immediately after the signature; the two
/// insertions are separately confirmable.
pub fn rewrite_declaration(
    path: &Path,
    identifier: &str,
    target_line: usize,
    kind: TargetKind,
    confirmer: &mut dyn Confirmer,
) -> Result<FileRewrite> {
    let mut source = SourceLines::read(path)?;
    let before_content = source.to_content();
    let before_hash = compute_hash(before_content.as_bytes());

    let original = source
        .line(target_line)
        .ok_or_else(|| WeaveError::LineOutOfRange {
            path: path.to_path_buf(),
            line: target_line,
        })?
        .to_string();

    let proposed = rewrite::insert_declaration_context(&original, identifier);

    let mut applied = false;
    let mut declined = false;

    if proposed != original {
        let edit = PendingEdit {
            line_number: target_line,
            original,
            proposed,
            frame: None,
        };
        if confirmer.confirm(&edit.render_prompt(path))? {
            source.set_line(target_line, edit.proposed);
            applied = true;
        } else {
            declined = true;
        }
    } else {
        log::warn!(
            "Declaration of '{}' not matched on {}:{}",
            identifier,
            path.display(),
            target_line + 1
        );
    }

    if kind == TargetKind::Function {
        let prompt = format!("Create span in {}?", identifier);
        if confirmer.confirm(&prompt)? {
            source.insert_after(target_line, &rewrite::span_boilerplate("ctx", identifier));
            applied = true;
        } else {
            declined = true;
        }
    }

    if !applied {
        let outcome = if declined {
            EditOutcome::Declined
        } else {
            EditOutcome::Unchanged
        };
        return Ok(FileRewrite {
            path: path.to_path_buf(),
            outcome,
            after_hash: before_hash.clone(),
            before_hash,
        });
    }

    let content = source.to_content();
    write_atomic(path, content.as_bytes())?;

    Ok(FileRewrite {
        path: path.to_path_buf(),
        outcome: EditOutcome::Applied,
        before_hash,
        after_hash: compute_hash(content.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AcceptAll;
    use std::fs;
    use tempfile::TempDir;

    /// Confirmer that declines every prompt.
    struct DeclineAll;

    impl Confirmer for DeclineAll {
        fn confirm(&mut self, _prompt: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_source_lines_round_trip() {
        let content = "a\nb\nc\n";
        assert_eq!(SourceLines::from_content(content).to_content(), content);

        let no_trailing = "a\nb\nc";
        assert_eq!(
            SourceLines::from_content(no_trailing).to_content(),
            no_trailing
        );
    }

    #[test]
    fn test_call_site_rewrite_applies_background_context() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("save.go");
        fs::write(
            &file,
            "func Save(id string) error {\n\tfoo := 1\n\treturn Update(id)\n}\n",
        )
        .expect("Failed to write file");

        let result = rewrite_call_site(&file, "Update", 2, &mut AcceptAll)
            .expect("rewrite should succeed");

        assert_eq!(result.outcome, EditOutcome::Applied);
        assert_ne!(result.before_hash, result.after_hash);

        let content = fs::read_to_string(&file).expect("Failed to read file");
        assert!(content.contains("return Update(context.Background(), id)"));
    }

    #[test]
    fn test_declined_edit_leaves_bytes_untouched() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("save.go");
        let original = "func Save(id string) error {\n\treturn Update(id)\n}\n";
        fs::write(&file, original).expect("Failed to write file");

        let result = rewrite_call_site(&file, "Update", 1, &mut DeclineAll)
            .expect("rewrite should succeed");

        assert_eq!(result.outcome, EditOutcome::Declined);
        assert_eq!(result.before_hash, result.after_hash);
        assert_eq!(
            fs::read_to_string(&file).expect("Failed to read file"),
            original
        );
    }

    #[test]
    fn test_line_without_call_is_unchanged() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("save.go");
        fs::write(&file, "func Save(id string) error {\n\treturn nil\n}\n")
            .expect("Failed to write file");

        let result = rewrite_call_site(&file, "Update", 1, &mut AcceptAll)
            .expect("rewrite should succeed");

        assert_eq!(result.outcome, EditOutcome::Unchanged);
    }

    #[test]
    fn test_reference_past_end_of_file_is_an_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("save.go");
        fs::write(&file, "func Save(id string) error {\n}\n").expect("Failed to write file");

        let result = rewrite_call_site(&file, "Update", 10, &mut AcceptAll);

        assert!(matches!(result, Err(WeaveError::LineOutOfRange { .. })));
    }

    #[test]
    fn test_declaration_gains_parameter_and_span() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("update.go");
        fs::write(
            &file,
            "func Update(id string) error {\n\treturn nil\n}\n",
        )
        .expect("Failed to write file");

        let result =
            rewrite_declaration(&file, "Update", 0, TargetKind::Function, &mut AcceptAll)
                .expect("rewrite should succeed");

        assert_eq!(result.outcome, EditOutcome::Applied);

        let content = fs::read_to_string(&file).expect("Failed to read file");
        assert!(content.contains("func Update(ctx context.Context, id string) error {"));
        assert!(content.contains("tracer.CreateSpanFromContext(ctx, logTag+\".Update\")"));
        assert!(content.contains("defer span.Finish()"));
        // Boilerplate lands between the signature and the body.
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[1].contains("span, _ :="));
        assert!(lines[2].contains("defer span.Finish()"));
    }

    #[test]
    fn test_interface_declaration_gets_no_span_prompt() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("store.go");
        fs::write(
            &file,
            "type Store interface {\n\tUpdate(id string) error\n}\n",
        )
        .expect("Failed to write file");

        let result =
            rewrite_declaration(&file, "Update", 1, TargetKind::Interface, &mut AcceptAll)
                .expect("rewrite should succeed");

        assert_eq!(result.outcome, EditOutcome::Applied);

        let content = fs::read_to_string(&file).expect("Failed to read file");
        assert!(content.contains("\tUpdate(ctx context.Context, id string) error"));
        assert!(!content.contains("tracer.CreateSpanFromContext"));
    }
}
