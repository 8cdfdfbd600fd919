//! Compiled templates.

use indexmap::IndexMap;

use crate::ast::Node;

/// A named template: an optional parent, a body and a set of named blocks.
///
/// A template with a parent is a child: rendering it displays the root of
/// its chain. The child contributes its blocks and the top-level `set`
/// nodes of its body; the rest of its body is never displayed.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    parent: Option<String>,
    body: Vec<Node>,
    blocks: IndexMap<String, Vec<Node>>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            body: Vec::new(),
            blocks: IndexMap::new(),
        }
    }

    /// Sets the parent template.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_body(mut self, body: Vec<Node>) -> Self {
        self.body = body;
        self
    }

    /// Defines block `name`. Redefining a block replaces it.
    pub fn with_block(mut self, name: impl Into<String>, body: Vec<Node>) -> Self {
        self.blocks.insert(name.into(), body);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn body(&self) -> &[Node] {
        &self.body
    }

    pub fn block(&self, name: &str) -> Option<&[Node]> {
        self.blocks.get(name).map(Vec::as_slice)
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Names of the blocks this template defines, in definition order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}
