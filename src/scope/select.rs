//! Context selection policy.
//!
//! Pure decision function combining the scope tracker's and the resolver's
//! output into the one expression to propagate. Reusing an existing context
//! preserves cancellation and deadline propagation already established in
//! the call chain; a fresh background context is the conservative fallback
//! when no upstream context is reachable by lexical analysis alone.

/// The synthesized fresh context expression.
pub const BACKGROUND_CONTEXT: &str = "context.Background()";

/// Select the context expression to thread through a call site.
///
/// Priority order, first match wins:
/// 1. a context created in the current scope (child binding),
/// 2. a context received as a parameter by the enclosing declaration,
/// 3. a fresh `context.Background()`.
pub fn select_context(child_binding: Option<&str>, incoming_context: Option<&str>) -> String {
    child_binding
        .or(incoming_context)
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| BACKGROUND_CONTEXT.to_string())
}
