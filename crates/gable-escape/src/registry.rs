//! Named escaper registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EscapeError, Result};
use crate::markup::{Markup, SafeString};
use crate::strategies::{
    escape_css, escape_html, escape_html_attr, escape_js, escape_url, CSS, HTML, HTML_ATTR, JS,
    URL,
};

/// An escaping function: raw text in, safe text out.
pub type EscapeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Registry of escaping strategies keyed by name.
///
/// A fresh registry holds the built-in strategies (`html`, `js`, `css`,
/// `url`, `html_attr`). Applications add their own with
/// [`register`](Self::register), which also replaces a built-in of the same
/// name.
///
/// # Example
///
/// ```rust
/// use gable_escape::{Escapers, Markup};
///
/// let escapers = Escapers::new();
/// let js = escapers.apply(&Markup::from("it's"), "js").unwrap();
/// assert_eq!(js.as_str(), r"it\u0027s");
///
/// // Safe for js, not for html: escaped again on top.
/// let html = escapers.apply(&Markup::Safe(js), "html").unwrap();
/// assert_eq!(html.strategy(), "html");
/// ```
#[derive(Clone)]
pub struct Escapers {
    table: HashMap<String, EscapeFn>,
}

impl Escapers {
    /// Creates a registry holding the built-in strategies.
    pub fn new() -> Self {
        let mut escapers = Self::empty();
        escapers.register(HTML, escape_html);
        escapers.register(JS, escape_js);
        escapers.register(CSS, escape_css);
        escapers.register(URL, escape_url);
        escapers.register(HTML_ATTR, escape_html_attr);
        escapers
    }

    /// Creates a registry with no strategies at all.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Registers (or replaces) a strategy.
    pub fn register<F>(&mut self, name: impl Into<String>, escaper: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.table.insert(name.into(), Arc::new(escaper));
    }

    /// Returns `true` if a strategy with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Names of all registered strategies, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Escapes raw text with the named strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EscapeError::UnknownStrategy`] if `strategy` is not registered.
    pub fn escape(&self, raw: &str, strategy: &str) -> Result<String> {
        let escaper = self
            .table
            .get(strategy)
            .ok_or_else(|| EscapeError::UnknownStrategy(strategy.to_string()))?;
        Ok(escaper(raw))
    }

    /// Makes `markup` safe for `strategy`.
    ///
    /// - Text already safe for `strategy` is returned unchanged.
    /// - Text safe for a different strategy loses its marker and is escaped
    ///   again, so the two passes compose.
    /// - Raw text is escaped.
    ///
    /// # Errors
    ///
    /// Returns [`EscapeError::UnknownStrategy`] if `strategy` is not registered.
    pub fn apply(&self, markup: &Markup, strategy: &str) -> Result<SafeString> {
        if let Markup::Safe(safe) = markup {
            if safe.is_safe_for(strategy) {
                return Ok(safe.clone());
            }
        }
        let escaped = self.escape(markup.as_str(), strategy)?;
        Ok(SafeString::new(strategy, escaped))
    }
}

impl Default for Escapers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Escapers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escapers")
            .field("strategies", &self.names())
            .finish()
    }
}
