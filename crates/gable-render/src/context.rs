//! Variables visible to a render.
//!
//! [`Context`] is the host-facing mapping of top-level variables. While
//! rendering, the engine keeps a [`Scope`]: a stack of [`Frame`]s where a
//! lookup walks from the innermost frame outwards. Each `for` loop pushes a
//! frame that binds the loop variables and `loop`, and pops it when the loop
//! ends, so the variables seen after a loop are exactly those seen before it.

use serde::Serialize;

use crate::error::ErrorKind;
use crate::loops::LoopContext;
use crate::value::{Map, Value};

/// Top-level variables passed to a render.
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: Map,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from any value that serializes to a mapping.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails or the value is not a mapping.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, ErrorKind> {
        match Value::from_serialize(data)? {
            Value::Map(map) => Ok(Self {
                vars: Map::clone(&map),
            }),
            Value::Null | Value::Undefined => Ok(Self::new()),
            _ => Err(ErrorKind::Serialization(
                "context data must serialize to a mapping".to_string(),
            )),
        }
    }

    /// Parses a JSON object into a context.
    pub fn from_json(json: &str) -> Result<Self, ErrorKind> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_serialize(&value)
    }

    /// Binds `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    /// Builder form of [`Context::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn into_map(self) -> Map {
        self.vars
    }
}

impl From<Map> for Context {
    fn from(vars: Map) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// One level of variable bindings.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    vars: Map,
    /// Index into the render's loop stack when this frame belongs to a loop.
    loop_slot: Option<usize>,
}

impl Frame {
    pub(crate) fn for_loop(slot: usize) -> Self {
        Self {
            vars: Map::new(),
            loop_slot: Some(slot),
        }
    }
}

/// Stack of frames for one template execution. The bottom frame holds the
/// top-level context and is never popped.
#[derive(Debug)]
pub(crate) struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    pub(crate) fn new(root: Map) -> Self {
        Self {
            frames: vec![Frame {
                vars: root,
                loop_slot: None,
            }],
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds `name` in the innermost frame.
    pub(crate) fn set(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.vars.insert(name.to_string(), value);
        }
    }

    /// Looks `name` up from the innermost frame outwards. A loop frame
    /// answers `loop` with its entry in `loops`.
    pub(crate) fn lookup(&self, name: &str, loops: &[LoopContext]) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.vars.get(name) {
                return Some(value.clone());
            }
            if name == "loop" {
                if let Some(ctx) = frame.loop_slot.and_then(|slot| loops.get(slot)) {
                    return Some(Value::from_object(ctx.clone()));
                }
            }
        }
        None
    }

    /// Every visible binding, inner frames shadowing outer ones.
    pub(crate) fn flatten(&self, loops: &[LoopContext]) -> Map {
        let mut out = Map::new();
        for frame in &self.frames {
            if let Some(ctx) = frame.loop_slot.and_then(|slot| loops.get(slot)) {
                out.insert("loop".to_string(), Value::from_object(ctx.clone()));
            }
            for (name, value) in &frame.vars {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }
}
