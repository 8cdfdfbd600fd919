//! Safe-string markers.
//!
//! A string that went through an escaper carries the name of the strategy it
//! is safe for. Emitting it again in the same format is a no-op; emitting it
//! in any other format escapes it again on top of the first pass.

use std::fmt;

/// A string already escaped for one output format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeString {
    strategy: String,
    text: String,
}

impl SafeString {
    /// Tags `text` as safe for `strategy` without escaping it.
    ///
    /// Use this for content that is trusted by construction, such as the
    /// output of a link builder that already produces valid HTML.
    pub fn new(strategy: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            text: text.into(),
        }
    }

    /// The strategy this text is safe for.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// The escaped text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the text may be emitted verbatim for `strategy`.
    pub fn is_safe_for(&self, strategy: &str) -> bool {
        self.strategy == strategy
    }

    /// Drops the marker and returns the text.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Content headed for an escaper: either raw text or text that is already
/// safe for some strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Markup {
    /// Untrusted text, escaped on every emission.
    Raw(String),
    /// Text already escaped for the strategy it carries.
    Safe(SafeString),
}

impl Markup {
    /// The underlying text, regardless of marker.
    pub fn as_str(&self) -> &str {
        match self {
            Markup::Raw(text) => text,
            Markup::Safe(safe) => safe.as_str(),
        }
    }

    /// Returns `true` if the text may be emitted verbatim for `strategy`.
    pub fn is_safe_for(&self, strategy: &str) -> bool {
        match self {
            Markup::Raw(_) => false,
            Markup::Safe(safe) => safe.is_safe_for(strategy),
        }
    }
}

impl From<String> for Markup {
    fn from(text: String) -> Self {
        Markup::Raw(text)
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Markup::Raw(text.to_string())
    }
}

impl From<SafeString> for Markup {
    fn from(safe: SafeString) -> Self {
        Markup::Safe(safe)
    }
}
