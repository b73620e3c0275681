//! Reference records and parsers for external locator output.
//!
//! The byte-offset locator and the cross-file reference finder are external
//! tools that report occurrences as line-oriented text. This module turns
//! that output into [`Reference`] records. Parsing is strictly positional:
//! a line that does not split into the expected fields is a malformed-input
//! error, never a value to guess at.

pub mod offset;

use crate::error::{Result, WeaveError};
use std::path::{Path, PathBuf};

/// Kind of identifier being targeted for context propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A plain function declaration (`func Name(` or `var Name = func(`).
    Function,
    /// An interface method declaration.
    Interface,
}

impl TargetKind {
    /// Convert to string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Function => "function",
            TargetKind::Interface => "interface",
        }
    }
}

/// One located occurrence of the target identifier.
///
/// Line numbers and offsets are 1-based, matching the external tools'
/// reporting conventions. Records are immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// File containing the occurrence.
    pub path: PathBuf,
    /// Line where the occurrence begins (1-based).
    pub start_line: usize,
    /// Byte offset where the occurrence begins.
    pub start_offset: usize,
    /// Line where the occurrence ends (1-based).
    pub end_line: usize,
    /// Byte offset where the occurrence ends.
    pub end_offset: usize,
    /// The literal source line or message text reported by the tool.
    pub text: String,
}

impl Reference {
    /// Check the record's ordering invariant: `start_line <= end_line`,
    /// and when the lines are equal, `start_offset < end_offset`.
    fn is_ordered(&self) -> bool {
        if self.start_line < self.end_line {
            return true;
        }
        self.start_line == self.end_line && self.start_offset < self.end_offset
    }
}

/// Parse byte-offset locator output into references.
///
/// The locator reports one match per line as `<lineNumber>:<byteOffset>:<lineText>`,
/// where the byte offset points at the start of the matching line. The text
/// field may itself contain the delimiter, so only the first two fields are
/// split off. Output order is preserved.
///
/// # Errors
/// Returns [`WeaveError::MalformedLocator`] when a line has too few fields,
/// a non-numeric field, or an empty text field.
pub fn parse_locator_output(output: &str, path: &Path) -> Result<Vec<Reference>> {
    let mut references = Vec::new();

    for raw in output.lines() {
        let mut fields = raw.splitn(3, ':');
        let (line, offset, text) = match (fields.next(), fields.next(), fields.next()) {
            (Some(line), Some(offset), Some(text)) => (line, offset, text),
            _ => {
                return Err(WeaveError::MalformedLocator {
                    line: raw.to_string(),
                })
            }
        };

        let start_line = parse_line_number(line).ok_or_else(|| WeaveError::MalformedLocator {
            line: raw.to_string(),
        })?;
        let start_offset: usize =
            offset.parse().map_err(|_| WeaveError::MalformedLocator {
                line: raw.to_string(),
            })?;

        let reference = Reference {
            path: path.to_path_buf(),
            start_line,
            start_offset,
            end_line: start_line,
            end_offset: start_offset + text.len(),
            text: text.to_string(),
        };

        if !reference.is_ordered() {
            return Err(WeaveError::MalformedLocator {
                line: raw.to_string(),
            });
        }

        references.push(reference);
    }

    Ok(references)
}

/// Parse reference-finder output into references.
///
/// The finder reports one reference per line as
/// `<path>:<startLine>.<startOffset>-<endLine>.<endOffset>:<message>`.
/// The first record is always the declaration site itself; the remainder are
/// call sites, in the order they will be rewritten. Output order is
/// preserved so that positional meaning survives parsing.
///
/// # Errors
/// Returns [`WeaveError::MalformedReferrer`] when a line has too few fields
/// or its location segment does not split into `line.offset` pairs.
pub fn parse_referrer_output(output: &str) -> Result<Vec<Reference>> {
    let mut references = Vec::new();

    for raw in output.lines() {
        let mut fields = raw.splitn(3, ':');
        let (path, location, message) = match (fields.next(), fields.next(), fields.next()) {
            (Some(path), Some(location), Some(message)) => (path, location, message),
            _ => {
                return Err(WeaveError::MalformedReferrer {
                    line: raw.to_string(),
                })
            }
        };

        let reference = parse_location(path, location, message).ok_or_else(|| {
            WeaveError::MalformedReferrer {
                line: raw.to_string(),
            }
        })?;

        if !reference.is_ordered() {
            return Err(WeaveError::MalformedReferrer {
                line: raw.to_string(),
            });
        }

        references.push(reference);
    }

    Ok(references)
}

/// Split a `startLine.startOffset-endLine.endOffset` segment into a record.
fn parse_location(path: &str, location: &str, message: &str) -> Option<Reference> {
    let (start, end) = location.split_once('-')?;
    let (start_line, start_offset) = parse_position(start)?;
    let (end_line, end_offset) = parse_position(end)?;

    Some(Reference {
        path: PathBuf::from(path),
        start_line,
        start_offset,
        end_line,
        end_offset,
        text: message.to_string(),
    })
}

/// Split a `line.offset` pair; the line number must be 1-based.
fn parse_position(position: &str) -> Option<(usize, usize)> {
    let (line, offset) = position.split_once('.')?;
    let line = parse_line_number(line)?;
    let offset = offset.parse().ok()?;
    Some((line, offset))
}

/// Parse a 1-based line number; zero is never a valid line.
fn parse_line_number(field: &str) -> Option<usize> {
    let line: usize = field.parse().ok()?;
    if line == 0 {
        return None;
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_round_trip() {
        let path = Path::new("user.go");
        let output = "12:345:func Update(id string) error {\n40:900:\tvar Update = func(id string) error {\n";

        let refs = parse_locator_output(output, path).expect("parse should succeed");

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].start_line, 12);
        assert_eq!(refs[0].start_offset, 345);
        assert_eq!(refs[0].text, "func Update(id string) error {");
        assert_eq!(refs[0].path, path);
        // Order matches input order.
        assert_eq!(refs[1].start_line, 40);
    }

    #[test]
    fn test_locator_text_may_contain_delimiter() {
        let path = Path::new("user.go");
        let output = "3:70:\tUpdate(id) // note: legacy\n";

        let refs = parse_locator_output(output, path).expect("parse should succeed");

        assert_eq!(refs[0].text, "\tUpdate(id) // note: legacy");
    }

    #[test]
    fn test_locator_rejects_missing_fields() {
        let result = parse_locator_output("12:345\n", Path::new("user.go"));
        assert!(matches!(result, Err(WeaveError::MalformedLocator { .. })));
    }

    #[test]
    fn test_locator_rejects_non_numeric_offset() {
        let result = parse_locator_output("12:oops:text\n", Path::new("user.go"));
        assert!(matches!(result, Err(WeaveError::MalformedLocator { .. })));
    }

    #[test]
    fn test_locator_rejects_zero_line() {
        let result = parse_locator_output("0:10:text\n", Path::new("user.go"));
        assert!(matches!(result, Err(WeaveError::MalformedLocator { .. })));
    }

    #[test]
    fn test_referrer_parses_declaration_first() {
        let output = "\
models/user.go:12.6-12.12:declaration of Update\n\
logic/save.go:30.2-30.8:reference to Update\n";

        let refs = parse_referrer_output(output).expect("parse should succeed");

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path, PathBuf::from("models/user.go"));
        assert_eq!(refs[0].start_line, 12);
        assert_eq!(refs[0].start_offset, 6);
        assert_eq!(refs[0].end_line, 12);
        assert_eq!(refs[0].end_offset, 12);
        assert_eq!(refs[1].path, PathBuf::from("logic/save.go"));
        assert_eq!(refs[1].text, "reference to Update");
    }

    #[test]
    fn test_referrer_rejects_bad_location_segment() {
        let result = parse_referrer_output("user.go:12.6:no range here\n");
        assert!(matches!(result, Err(WeaveError::MalformedReferrer { .. })));

        let result = parse_referrer_output("user.go:12-13:missing offsets\n");
        assert!(matches!(result, Err(WeaveError::MalformedReferrer { .. })));
    }

    #[test]
    fn test_referrer_rejects_inverted_span() {
        let result = parse_referrer_output("user.go:12.8-12.4:inverted\n");
        assert!(matches!(result, Err(WeaveError::MalformedReferrer { .. })));
    }
}
