//! Error types for template rendering.
//!
//! Every failure aborts the render in progress. The lower-level cause is an
//! [`ErrorKind`]; the engine wraps it in a [`RenderError`] that records the
//! template being executed and, when the template carries line markers, the
//! source line.

use std::fmt;

use thiserror::Error;

/// What went wrong.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The template resolver has no template with this name.
    #[error("template not found: \"{name}\"")]
    TemplateNotFound { name: String },

    /// A template appears twice in its own inheritance chain.
    #[error("circular inheritance: {}", .chain.join(" -> "))]
    CircularInheritance { chain: Vec<String> },

    /// Attribute or item access on an undefined value.
    #[error("impossible to access attribute \"{attribute}\" on an undefined value")]
    AttributeError { attribute: String },

    /// Undefined top-level variable while `strict_variables` is enabled.
    #[error("variable \"{name}\" does not exist")]
    UndefinedVariable { name: String },

    /// No function registered under this name.
    #[error("unknown function \"{0}\"")]
    UnknownFunction(String),

    /// No filter registered under this name.
    #[error("unknown filter \"{0}\"")]
    UnknownFilter(String),

    /// Escaping failed (unknown strategy).
    #[error(transparent)]
    Escape(#[from] gable_escape::EscapeError),

    /// A block requested through the block-invocation API does not exist.
    #[error("block \"{block}\" does not exist")]
    UnknownBlock { block: String },

    /// `parent()` called from the least-derived definition of a block.
    #[error("block \"{block}\" has no parent definition")]
    NoParentBlock { block: String },

    /// Includes or blocks nested deeper than the configured limit.
    #[error("nesting limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    /// Invalid operation raised by the engine or by a registered callable.
    #[error("{0}")]
    InvalidOperation(String),

    /// Converting host data to template values failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ErrorKind {
    fn from(err: serde_json::Error) -> Self {
        ErrorKind::Serialization(err.to_string())
    }
}

/// Error returned by every render entry point.
///
/// Carries the name of the template that was executing when the failure
/// happened and, if known, the source line.
#[derive(Debug)]
pub struct RenderError {
    template: String,
    line: Option<u32>,
    kind: ErrorKind,
}

impl RenderError {
    /// Creates an error raised while executing `template`.
    pub fn new(template: impl Into<String>, line: Option<u32>, kind: ErrorKind) -> Self {
        Self {
            template: template.into(),
            line,
            kind,
        }
    }

    /// The underlying cause.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consumes the error, returning the underlying cause.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Name of the template being executed.
    pub fn template_name(&self) -> &str {
        &self.template
    }

    /// Best-effort source line.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in \"{}\"", self.kind, self.template)?;
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
