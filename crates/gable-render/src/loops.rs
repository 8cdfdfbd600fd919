//! Loop metadata exposed as `loop` inside `for` bodies.

use crate::value::{Object, Value};

/// Position of the current iteration within a `for` loop.
///
/// For a sequence of length `n` at zero-based position `i`:
/// `index0 = i`, `index = i + 1`, `revindex0 = n - i - 1`,
/// `revindex = n - i`, `first = (i == 0)`, `last = (i == n - 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopContext {
    index0: usize,
    index: usize,
    revindex0: usize,
    revindex: usize,
    length: usize,
    first: bool,
    last: bool,
    parent: Option<Box<LoopContext>>,
}

impl LoopContext {
    /// Metadata for the first iteration over `length` items, nested inside
    /// `parent` if the loop is itself inside a loop.
    pub fn begin(length: usize, parent: Option<&LoopContext>) -> Self {
        Self {
            index0: 0,
            index: 1,
            revindex0: length.saturating_sub(1),
            revindex: length,
            length,
            first: true,
            last: length == 1,
            parent: parent.cloned().map(Box::new),
        }
    }

    /// Moves to the next iteration.
    pub fn advance(&mut self) {
        self.index0 += 1;
        self.index += 1;
        self.revindex0 = self.revindex0.saturating_sub(1);
        self.revindex = self.revindex.saturating_sub(1);
        self.first = false;
        self.last = self.revindex0 == 0;
    }

    pub fn index0(&self) -> usize {
        self.index0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn revindex0(&self) -> usize {
        self.revindex0
    }

    pub fn revindex(&self) -> usize {
        self.revindex
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn is_last(&self) -> bool {
        self.last
    }

    /// The enclosing loop's metadata at the time this loop started.
    pub fn parent(&self) -> Option<&LoopContext> {
        self.parent.as_deref()
    }
}

impl Object for LoopContext {
    fn get_item(&self, key: &Value) -> Option<Value> {
        key.as_str().and_then(|name| self.get_field(name))
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "index0" => Value::from(self.index0),
            "index" => Value::from(self.index),
            "revindex0" => Value::from(self.revindex0),
            "revindex" => Value::from(self.revindex),
            "length" => Value::from(self.length),
            "first" => Value::Bool(self.first),
            "last" => Value::Bool(self.last),
            "parent" => match &self.parent {
                Some(parent) => Value::from_object(parent.as_ref().clone()),
                None => Value::Null,
            },
            _ => return None,
        };
        Some(value)
    }
}
