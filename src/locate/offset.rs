//! Byte-offset calculation for locator matches.
//!
//! The reference finder addresses source locations as absolute byte offsets
//! into a file. The locator only reports the byte offset of a matching
//! line's start, so the identifier's local position within that line has to
//! be found again and added to the line's base offset.

use crate::error::{Result, WeaveError};
use regex::Regex;

/// Locate a function identifier within a line and return its absolute
/// `[start, end)` byte offsets.
///
/// The identifier must be preceded by whitespace so that substrings of
/// longer identifiers are not matched. The leading whitespace byte is
/// skipped when computing the start offset.
///
/// # Errors
/// Returns [`WeaveError::IdentifierNotFound`] when the identifier does not
/// occur in the expected shape on the line.
pub fn calculate_function_offset(
    text: &str,
    identifier: &str,
    line_offset: usize,
) -> Result<(usize, usize)> {
    let pattern = Regex::new(&format!(r"\s{}", regex::escape(identifier)))
        .map_err(|e| WeaveError::Other(format!("Invalid identifier pattern: {}", e)))?;

    let found = pattern
        .find(text)
        .ok_or_else(|| WeaveError::IdentifierNotFound {
            identifier: identifier.to_string(),
            line: text.to_string(),
        })?;

    Ok((line_offset + found.start() + 1, line_offset + found.end()))
}

/// Locate an interface method identifier within a line and return its
/// absolute `[start, end)` byte offsets.
///
/// Interface method declarations are anchored at the start of the line,
/// allowing for leading whitespace. The start offset is corrected by one to
/// skip the leading delimiter character, matching what the reference finder
/// expects to receive.
///
/// # Errors
/// Returns [`WeaveError::IdentifierNotFound`] when the identifier does not
/// occur in the expected shape on the line.
pub fn calculate_interface_offset(
    text: &str,
    identifier: &str,
    line_offset: usize,
) -> Result<(usize, usize)> {
    let pattern = Regex::new(&format!(r"^\s*({})", regex::escape(identifier)))
        .map_err(|e| WeaveError::Other(format!("Invalid identifier pattern: {}", e)))?;

    let captures = pattern
        .captures(text)
        .ok_or_else(|| WeaveError::IdentifierNotFound {
            identifier: identifier.to_string(),
            line: text.to_string(),
        })?;

    // Anchored patterns always produce group 1 on a match.
    let found = captures.get(1).ok_or_else(|| WeaveError::IdentifierNotFound {
        identifier: identifier.to_string(),
        line: text.to_string(),
    })?;

    Ok((line_offset + found.start() + 1, line_offset + found.end()))
}
