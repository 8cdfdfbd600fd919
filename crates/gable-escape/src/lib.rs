//! # Gable Escape - Output-format escaping
//!
//! `gable-escape` maps raw values to text that is safe inside one output
//! format (HTML text, JavaScript strings, CSS, URLs, HTML attributes). It is
//! the escaping policy used by `gable-render`, but has no dependency on it.
//!
//! ## Safe markers
//!
//! Escaped text is returned as a [`SafeString`] tagged with the strategy it
//! is safe for. [`Escapers::apply`] never escapes text twice for the same
//! strategy, and always escapes again for a different one:
//!
//! ```rust
//! use gable_escape::{Escapers, Markup};
//!
//! let escapers = Escapers::new();
//!
//! let once = escapers.apply(&Markup::from("<b>"), "html").unwrap();
//! let twice = escapers.apply(&Markup::Safe(once.clone()), "html").unwrap();
//! assert_eq!(once, twice);
//!
//! let js = escapers.apply(&Markup::from(r"A\B"), "js").unwrap();
//! assert_eq!(js.as_str(), r"A\\B");
//! ```
//!
//! ## Strategies
//!
//! | Name | Escapes |
//! |------|---------|
//! | `html` | `& < > " '` |
//! | `js` | everything outside `[A-Za-z0-9,._]` |
//! | `css` | everything outside `[A-Za-z0-9]` |
//! | `url` | every byte outside `[A-Za-z0-9-_.~]` |
//! | `html_attr` | everything outside `[A-Za-z0-9,.-_]` |

mod error;
mod markup;
mod registry;
mod strategies;

pub use error::{EscapeError, Result};
pub use markup::{Markup, SafeString};
pub use registry::{EscapeFn, Escapers};
pub use strategies::{
    escape_css, escape_html, escape_html_attr, escape_js, escape_url, CSS, HTML, HTML_ATTR, JS,
    URL,
};
