//! Generic error handling utilities
//!
//! Provides unified error handling that can work across different error types
//! while keeping domain-specific error logging patterns in one place.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// User-actionable errors (a missing config key, a threshold out of range) carry
/// a message the operator can act on directly and are shown verbatim. System
/// errors (a refused connection, an IO failure) are reported with generic
/// context at error level; the detail is only emitted at debug level.
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` where a stored message exists; errors whose `Display`
/// output is already the actionable message may return `None` and rely on the
/// logging fallback.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a specific, operator-actionable message
    fn is_user_actionable(&self) -> bool;

    /// The specific message to surface when this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log an error with detail appropriate to its specificity
///
/// User-actionable errors log their own message; system errors log the
/// operation context. Full error detail goes to the debug level either way.
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    if error.is_user_actionable() {
        match error.user_message() {
            Some(user_msg) => log::error!("FATAL: {user_msg}"),
            None => log::error!("FATAL: {error}"),
        }
    } else {
        log::error!("FATAL: {operation_context}");
    }
    log::debug!("DETAIL: {error}");
    log::debug!("DEBUG_DETAILS: {error:?}");
}
