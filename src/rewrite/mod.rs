//! Textual line rewriting for context insertion.
//!
//! All rewrites are single-line string transformations that preserve the
//! surrounding code exactly. The rewriter never touches a line it cannot
//! match; callers treat an unchanged result as "nothing to rewrite here".

/// The Go context type inserted into declarations.
pub const CONTEXT_TYPE: &str = "context.Context";

/// The typed context parameter inserted as a declaration's first parameter.
pub const CONTEXT_PARAM: &str = "ctx context.Context";

/// Insert a context expression as the first argument of every call to
/// `identifier` on the line.
///
/// Handles the function-value special case where the identifier is being
/// reassigned (`identifier = func(` gains a typed context parameter instead
/// of a propagated value). A call left with an empty parameter remainder
/// (`, )`) is collapsed back to `)`.
pub fn insert_call_context(line: &str, identifier: &str, context: &str) -> String {
    let call = format!("{}(", identifier);
    let func_assign = format!("{} = func(", identifier);

    let rewritten = if line.contains(&call) {
        line.replace(&call, &format!("{}({}, ", identifier, context.trim()))
    } else if line.contains(&func_assign) {
        line.replace(
            &func_assign,
            &format!("{} = func({}, ", identifier, CONTEXT_PARAM),
        )
    } else {
        line.to_string()
    };

    rewritten.replace(", )", ")")
}

/// Insert a typed context parameter as the first parameter of the target's
/// own declaration line.
pub fn insert_declaration_context(line: &str, identifier: &str) -> String {
    insert_call_context(line, identifier, CONTEXT_PARAM)
}

/// Trace-span boilerplate inserted immediately after a declaration line:
/// start a span derived from the given context expression, and schedule its
/// completion to run when the function exits.
pub fn span_boilerplate(context_expr: &str, identifier: &str) -> [String; 2] {
    [
        format!(
            "\tspan, _ := tracer.CreateSpanFromContext({}, logTag+\".{}\")",
            context_expr, identifier
        ),
        "\tdefer span.Finish()".to_string(),
    ]
}
