//! Common result and error types for the weft compiler.

/// The standard result type for operations that can only fail on a compiler bug.
///
/// User-facing problems (a broken adjacency table, an inconsistent frame mask)
/// are reported through the per-crate error enums. `Err(InternalError)` means
/// two stages disagreed about something they must agree on.
pub type WeftResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in weft, not a problem in the fabric description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
