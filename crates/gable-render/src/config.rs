//! Engine configuration.
//!
//! [`EngineConfig`] controls auto-escaping, strictness about undefined
//! variables and the nesting limits for includes and blocks. It can be built
//! in code or loaded from YAML:
//!
//! ```rust
//! use gable_render::{AutoEscape, EngineConfig};
//!
//! let config = EngineConfig::from_yaml(r#"
//! autoescape: name
//! strict_variables: true
//! "#).unwrap();
//!
//! assert_eq!(config.autoescape, AutoEscape::ByName);
//! assert!(config.strict_variables);
//! assert_eq!(config.max_include_depth, 32);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use gable_escape::{CSS, HTML, JS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default limit for nested includes.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Default limit for blocks displayed inside one another.
pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 64;

/// Which escaping strategy `print` nodes apply.
///
/// In YAML: `false`, `"none"` or `"off"` disable escaping, `"name"` selects
/// [`AutoEscape::ByName`], `true` means `"html"`, any other string names a
/// strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AutoEscapeRepr", into = "AutoEscapeRepr")]
pub enum AutoEscape {
    /// Print values verbatim.
    Disabled,
    /// Escape every printed value with this strategy.
    Strategy(String),
    /// Pick the strategy from the owning template's name.
    ///
    /// The dotted suffixes of the file name are read right to left and the
    /// first known one decides: `html`/`htm`/`xml` → html, `js` → js,
    /// `css` → css, `txt` → disabled. Unknown suffixes (such as a template
    /// language extension) are skipped; with no known suffix, html is used.
    ByName,
}

impl AutoEscape {
    /// The strategy for printing values owned by `template_name`.
    pub fn strategy_for<'a>(&'a self, template_name: &str) -> Option<&'a str> {
        match self {
            AutoEscape::Disabled => None,
            AutoEscape::Strategy(strategy) => Some(strategy.as_str()),
            AutoEscape::ByName => strategy_from_name(template_name),
        }
    }
}

impl Default for AutoEscape {
    fn default() -> Self {
        AutoEscape::Strategy(HTML.to_string())
    }
}

fn strategy_from_name(name: &str) -> Option<&'static str> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let Some((_, extensions)) = file.split_once('.') else {
        return Some(HTML);
    };
    for suffix in extensions.rsplit('.') {
        match suffix.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xml" => return Some(HTML),
            "js" => return Some(JS),
            "css" => return Some(CSS),
            "txt" => return None,
            _ => continue,
        }
    }
    Some(HTML)
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AutoEscapeRepr {
    Flag(bool),
    Name(String),
}

impl From<AutoEscapeRepr> for AutoEscape {
    fn from(repr: AutoEscapeRepr) -> Self {
        match repr {
            AutoEscapeRepr::Flag(true) => AutoEscape::Strategy(HTML.to_string()),
            AutoEscapeRepr::Flag(false) => AutoEscape::Disabled,
            AutoEscapeRepr::Name(name) => match name.as_str() {
                "" | "none" | "off" | "false" => AutoEscape::Disabled,
                "name" => AutoEscape::ByName,
                _ => AutoEscape::Strategy(name),
            },
        }
    }
}

impl From<AutoEscape> for AutoEscapeRepr {
    fn from(mode: AutoEscape) -> Self {
        match mode {
            AutoEscape::Disabled => AutoEscapeRepr::Flag(false),
            AutoEscape::Strategy(name) => AutoEscapeRepr::Name(name),
            AutoEscape::ByName => AutoEscapeRepr::Name("name".to_string()),
        }
    }
}

/// Rendering options shared by every render of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Escaping applied by `print` nodes. Defaults to html.
    pub autoescape: AutoEscape,
    /// Fail on undefined top-level variables instead of rendering them empty.
    pub strict_variables: bool,
    /// Maximum nesting of includes.
    pub max_include_depth: usize,
    /// Maximum nesting of block displays, counted across includes.
    pub max_block_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autoescape: AutoEscape::default(),
            strict_variables: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Sets the auto-escape mode.
    pub fn with_autoescape(mut self, autoescape: AutoEscape) -> Self {
        self.autoescape = autoescape;
        self
    }

    /// Enables or disables strict variable lookup.
    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    /// Sets the include depth limit.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_max_block_depth(mut self, depth: usize) -> Self {
        self.max_block_depth = depth;
        self
    }
}

/// Errors raised while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML is malformed or has unknown keys.
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
