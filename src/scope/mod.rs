//! Lexical scope tracking over a flat sequence of Go declarations.
//!
//! A single left-to-right pass over a file's lines maintains the innermost
//! enclosing function-like declaration and the most recent context-typed
//! local assignment. The file is treated as a flat sequence of top-level
//! declarations: scopes do not nest, and each declaration header supersedes
//! the previous frame outright. This is deliberately not a parse tree; the
//! behavioral contract only ever needs "most recent enclosing header" and
//! "most recent context-like assignment".

pub mod select;

use regex::Regex;
use std::sync::LazyLock;

/// Matches function-like declaration headers: `func ... {` and
/// `var ... = func(`.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"func .*\{|var .* = func\(").expect("HEADER_RE regex should compile")
});

/// Captures the parameter name immediately preceding the context type
/// annotation in a declaration header.
static INCOMING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" \w+\(.*?(\w+) context\.Context").expect("INCOMING_RE regex should compile")
});

/// Captures a leading identifier containing the context marker, followed by
/// an assignment operator (`=` or `:=`).
static CHILD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w*[cC]tx\w*)[^=]*=").expect("CHILD_RE regex should compile")
});

/// The function-like declaration currently enclosing the scanned line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    /// The raw declaration header text.
    pub header_line: String,
    /// Line index where this frame began (0-based).
    pub header_line_number: usize,
    /// Parameter name that already carries a context value received from
    /// the caller, when the header declares one.
    pub incoming_context: Option<String>,
}

/// Result of scanning a file prefix: the enclosing frame and the most
/// recent in-scope context-like binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeScan {
    /// The innermost enclosing declaration, if any header was crossed.
    pub frame: Option<ScopeFrame>,
    /// The most recent context-typed local assignment within the frame.
    pub child_context: Option<String>,
}

impl ScopeScan {
    /// The incoming context parameter of the enclosing frame, if any.
    pub fn incoming_context(&self) -> Option<&str> {
        self.frame
            .as_ref()
            .and_then(|frame| frame.incoming_context.as_deref())
    }
}

/// Scan lines up to (not including) the target line.
///
/// Each declaration header replaces the current frame and clears the child
/// binding; scope-local state must not leak across declarations. Matching
/// assignment lines overwrite the child binding, so only the latest one
/// survives. The pass is idempotent: scanning the same prefix always yields
/// the same result.
pub fn scan_to_line(lines: &[&str], target_line: usize) -> ScopeScan {
    let mut scan = ScopeScan::default();

    for (index, line) in lines.iter().enumerate().take(target_line) {
        if HEADER_RE.is_match(line) {
            scan.frame = Some(ScopeFrame {
                header_line: line.to_string(),
                header_line_number: index,
                incoming_context: find_incoming_context(line),
            });
            scan.child_context = None;
        }

        if let Some(binding) = find_child_context(line) {
            scan.child_context = Some(binding);
        }
    }

    scan
}

/// Extract the context parameter name from a declaration header.
///
/// ```
/// use ctxweave::scope::find_incoming_context;
///
/// let header = "func (user *Model) UpdateLegacy(ctx context.Context, id string) error {";
/// assert_eq!(find_incoming_context(header), Some("ctx".to_string()));
/// ```
pub fn find_incoming_context(line: &str) -> Option<String> {
    INCOMING_RE
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

/// Extract the assigned identifier from a context-typed local assignment.
///
/// ```
/// use ctxweave::scope::find_child_context;
///
/// let line = "\tchildCtx := tracer.InsertSpanIntoContext(ctx, span)";
/// assert_eq!(find_child_context(line), Some("childCtx".to_string()));
/// ```
pub fn find_child_context(line: &str) -> Option<String> {
    CHILD_RE
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_supersedes_previous_frame() {
        let lines = vec![
            "func First(ctx context.Context) error {",
            "\treturn nil",
            "}",
            "func Second(id string) error {",
            "\treturn nil",
        ];

        let scan = scan_to_line(&lines, 4);

        let frame = scan.frame.expect("frame should exist");
        assert_eq!(frame.header_line_number, 3);
        assert_eq!(frame.incoming_context, None);
    }

    #[test]
    fn test_new_frame_clears_child_binding() {
        // The binding is set on the line immediately before the next header
        // and must still be cleared on frame entry.
        let lines = vec![
            "func First(id string) error {",
            "\tchildCtx := tracer.InsertSpanIntoContext(ctx, span)",
            "func Second(id string) error {",
            "\tUpdate(id)",
        ];

        let scan = scan_to_line(&lines, 3);

        assert_eq!(scan.child_context, None);
        assert_eq!(
            scan.frame.expect("frame should exist").header_line_number,
            2
        );
    }

    #[test]
    fn test_child_binding_most_recent_wins() {
        let lines = vec![
            "func Save(id string) error {",
            "\tctx, cancel = context.WithTimeout(context.Background(), timeout)",
            "\tchildCtx := tracer.InsertSpanIntoContext(ctx, span)",
            "\tUpdate(id)",
        ];

        let scan = scan_to_line(&lines, 3);

        assert_eq!(scan.child_context, Some("childCtx".to_string()));
    }

    #[test]
    fn test_target_line_itself_is_not_scanned() {
        let lines = vec![
            "func Save(id string) error {",
            "\tchildCtx := tracer.InsertSpanIntoContext(ctx, span)",
        ];

        let scan = scan_to_line(&lines, 1);

        assert_eq!(scan.child_context, None);
    }

    #[test]
    fn test_incoming_context_from_method_header() {
        let header = "func (user *Model) UpdateLegacy(ctx context.Context, serviceID string) error {";
        assert_eq!(find_incoming_context(header), Some("ctx".to_string()));
    }

    #[test]
    fn test_incoming_context_not_first_parameter() {
        let header = "func Load(id string, reqCtx context.Context) error {";
        assert_eq!(find_incoming_context(header), Some("reqCtx".to_string()));
    }

    #[test]
    fn test_incoming_context_without_trailing_comma() {
        let header = "func UpdateLegacy(parent context.Context) error {";
        assert_eq!(find_incoming_context(header), Some("parent".to_string()));
    }

    #[test]
    fn test_func_value_header_is_a_frame() {
        let lines = vec![
            "var handler = func(ctx context.Context, msg string) {",
            "\tUpdate(msg)",
        ];

        let scan = scan_to_line(&lines, 1);

        let frame = scan.frame.expect("frame should exist");
        assert_eq!(frame.incoming_context, Some("ctx".to_string()));
    }

    #[test]
    fn test_plain_assignment_is_not_a_binding() {
        let lines = vec!["func Save(id string) error {", "\terr = store.Flush()"];

        let scan = scan_to_line(&lines, 2);

        assert_eq!(scan.child_context, None);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let lines = vec![
            "func Save(ctx context.Context, id string) error {",
            "\tchildCtx := tracer.InsertSpanIntoContext(ctx, span)",
            "\tUpdate(id)",
        ];

        let first = scan_to_line(&lines, 2);
        let second = scan_to_line(&lines, 2);

        assert_eq!(first, second);
    }
}
