//! Block tables.
//!
//! For a chain `[child, ..., root]`, the table maps every block name to the
//! templates defining it, most-derived first. Depth 0 is the definition that
//! gets displayed; depth `n + 1` is what `parent()` reaches from depth `n`.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::template::Template;

#[derive(Debug, Clone, Default)]
pub struct BlockTable {
    entries: IndexMap<String, Vec<Arc<Template>>>,
}

impl BlockTable {
    /// Builds the table for an inheritance chain ordered child first.
    ///
    /// The root's blocks are entered first and each more-derived template
    /// overlays them, so a child definition always wins.
    pub fn from_chain(chain: &[Arc<Template>]) -> Self {
        let mut entries: IndexMap<String, Vec<Arc<Template>>> = IndexMap::new();
        for template in chain.iter().rev() {
            for name in template.block_names() {
                entries
                    .entry(name.to_string())
                    .or_default()
                    .insert(0, Arc::clone(template));
            }
        }
        Self { entries }
    }

    /// The template whose definition of `name` is displayed.
    pub fn resolve(&self, name: &str) -> Option<&Arc<Template>> {
        self.resolve_at(name, 0)
    }

    /// The definition of `name` at `depth` (0 = most derived).
    pub fn resolve_at(&self, name: &str, depth: usize) -> Option<&Arc<Template>> {
        self.entries.get(name).and_then(|defs| defs.get(depth))
    }

    /// All definitions of `name`, most derived first.
    pub fn definitions(&self, name: &str) -> &[Arc<Template>] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Block names, root blocks first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
