//! Template resolution by name.
//!
//! The engine asks a [`TemplateSource`] for templates by name while it
//! resolves inheritance chains and includes. [`TemplateRegistry`] is the
//! in-memory source; any `Fn(&str) -> Option<Arc<Template>>` closure is a
//! source too.
//!
//! # Names
//!
//! Names are normalized before lookup: backslashes become `/`, repeated
//! slashes collapse and a leading slash is dropped, so `"/class.html.twig"`,
//! `"class.html.twig"` and `"components//class.html.twig"` style spellings
//! reach the same entry.
//!
//! # Fallbacks
//!
//! Templates added with [`TemplateRegistry::add_fallback`] are only used when
//! no regular template has the same name. This lets an application ship a
//! default theme that users override template by template.
//!
//! ```rust
//! use gable_render::{Node, Template, TemplateRegistry};
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add_fallback(Template::new("footer.html").with_body(vec![Node::text("default")]));
//! registry.add(Template::new("footer.html").with_body(vec![Node::text("custom")]));
//!
//! let footer = registry.get("/footer.html").unwrap();
//! assert!(matches!(&footer.body()[0], Node::Text(text) if text == "custom"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::template::Template;

/// Provides templates to the engine. Must be shareable across threads.
pub trait TemplateSource: Send + Sync {
    /// Returns the template registered under `name`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when no such template exists.
    fn resolve(&self, name: &str) -> Result<Arc<Template>, RegistryError>;
}

impl<F> TemplateSource for F
where
    F: Fn(&str) -> Option<Arc<Template>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Result<Arc<Template>, RegistryError> {
        self(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }
}

/// Error type for template resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No template with this name.
    NotFound {
        /// The name that was requested
        name: String,
    },

    /// The source knows the template but could not produce it.
    Load {
        name: String,
        /// Error message
        message: String,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound { name } => {
                write!(f, "Template not found: \"{}\"", name)
            }
            RegistryError::Load { name, message } => {
                write!(f, "Failed to load template \"{}\": {}", name, message)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Normalizes a template name for lookup.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// In-memory template store.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<Template>>,
    fallback: HashMap<String, Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under its own (normalized) name, replacing any
    /// previous template with that name.
    pub fn add(&mut self, template: Template) -> Arc<Template> {
        let template = Arc::new(template);
        self.add_shared(Arc::clone(&template));
        template
    }

    /// Registers an already shared template.
    pub fn add_shared(&mut self, template: Arc<Template>) {
        self.templates
            .insert(normalize_name(template.name()), template);
    }

    /// Registers a lowest-priority template.
    pub fn add_fallback(&mut self, template: Template) {
        self.fallback
            .insert(normalize_name(template.name()), Arc::new(template));
    }

    /// Looks a template up, regular templates first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the template doesn't exist.
    pub fn get(&self, name: &str) -> Result<Arc<Template>, RegistryError> {
        let key = normalize_name(name);
        self.templates
            .get(&key)
            .or_else(|| self.fallback.get(&key))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.templates.contains_key(&key) || self.fallback.contains_key(&key)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(&normalize_name(name))
    }

    /// Number of distinct names, fallbacks included.
    pub fn len(&self) -> usize {
        self.names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() && self.fallback.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self
            .templates
            .keys()
            .chain(self.fallback.keys().filter(|k| !self.templates.contains_key(*k)))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.into_iter()
    }
}

impl TemplateSource for TemplateRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<Template>, RegistryError> {
        self.get(name)
    }
}

impl FromIterator<Template> for TemplateRegistry {
    fn from_iter<I: IntoIterator<Item = Template>>(iter: I) -> Self {
        let mut registry = Self::new();
        for template in iter {
            registry.add(template);
        }
        registry
    }
}
