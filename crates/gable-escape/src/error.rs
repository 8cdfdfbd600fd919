//! Error types for the escape crate.

use thiserror::Error;

/// Errors raised while escaping a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    /// No escaper is registered under the requested strategy name.
    #[error("unknown escaping strategy \"{0}\"")]
    UnknownStrategy(String),
}

/// Result type for escape operations.
pub type Result<T> = std::result::Result<T, EscapeError>;
